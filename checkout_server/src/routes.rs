//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Every handler here awaits the database or the payment provider,
//! so they are all async.
use actix_web::{get, web, HttpResponse, Responder};
use checkout_engine::{
    traits::{OrderManagement, PricingDatabase},
    CheckoutApi,
    OrderFlowApi,
    OrderFlowError,
    PaymentAuthorizer,
};
use log::*;
use stripe_tools::StripeEvent;

use crate::{
    data_objects::{CheckoutRequestDto, CheckoutResponse, JsonResponse},
    errors::ServerError,
    integrations::stripe::payment_event_from_stripe,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Checkout  ----------------------------------------------------
route!(checkout => Post "/checkout" impl PricingDatabase, PaymentAuthorizer);
/// Prices the cart and opens a payment intent for it.
///
/// The response carries the priced lines, the totals and the payment intent's client secret, which the storefront
/// uses to collect the payment. No order exists at this point. It is only created once Stripe reports the payment as
/// successful via the webhook.
pub async fn checkout<B, A>(
    api: web::Data<CheckoutApi<B, A>>,
    body: web::Json<CheckoutRequestDto>,
) -> Result<HttpResponse, ServerError>
where
    B: PricingDatabase,
    A: PaymentAuthorizer,
{
    trace!("💻️ Received checkout request");
    let request = body.into_inner().into();
    let result = api.checkout(request).await.map_err(|e| {
        debug!("💻️ Checkout failed. {e}");
        ServerError::from(e)
    })?;
    info!("💻️ Checkout complete. Payment intent {} for {}", result.payment_intent_id, result.cart.grand_total);
    Ok(HttpResponse::Ok().json(CheckoutResponse::from(result)))
}

//----------------------------------------------   Webhook  ----------------------------------------------------
route!(stripe_webhook => Post "/webhook" impl OrderManagement);
/// Receives payment notifications from Stripe.
///
/// This route must be wrapped in [`crate::middleware::StripeSignatureFactory`]. By the time the handler runs, the
/// signature has been checked and the event parsed. Redelivered and concurrent events are absorbed by the order flow
/// and are answered with a 200, as are event types we don't act on.
///
/// A store failure is answered with a 500 so that Stripe delivers the event again. An event that can never become an
/// order is acknowledged with a 200 failure response, since redelivering it would not change anything.
pub async fn stripe_webhook<B>(
    event: web::ReqData<StripeEvent>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement,
{
    let event = event.into_inner();
    debug!("💻️ Received Stripe event {} ({})", event.id, event.event_type);
    let event_id = event.id.clone();
    let payment_event = payment_event_from_stripe(event).map_err(|e| {
        warn!("💻️ Stripe event {event_id} does not hold a valid payment intent. {e}");
        ServerError::InvalidRequest(e.to_string())
    })?;
    match api.process_payment_event(payment_event).await {
        Ok(outcome) => {
            info!("💻️ Stripe event {event_id} processed. {outcome}");
            Ok(HttpResponse::Ok().json(JsonResponse::success(outcome)))
        },
        Err(e @ OrderFlowError::InvalidMetadata { .. }) => {
            error!("💻️ Stripe event {event_id} cannot be turned into an order and is dropped. {e}");
            Ok(HttpResponse::Ok().json(JsonResponse::failure(e)))
        },
        Err(e) => {
            error!("💻️ Could not process Stripe event {event_id}. Stripe will retry the delivery. {e}");
            Err(e.into())
        },
    }
}
