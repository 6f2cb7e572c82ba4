//! Stripe signature middleware for Actix Web.
//!
//! Stripe signs every webhook delivery with the endpoint's signing secret. The signature arrives in the
//! `Stripe-Signature` header and covers the timestamp and the raw request body, byte for byte.
//!
//! This middleware reads the raw body, verifies the signature and the replay window, and parses the event. Only then
//! is the request passed on, with the verified [`StripeEvent`] stored in the request extensions. Handlers behind this
//! middleware extract it with `web::ReqData<StripeEvent>` and never look at the body themselves.
//!
//! Rejected requests never reach the handler.
use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_http::h1;
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    web,
    Error,
    HttpMessage,
};
use chrono::Duration;
use cko_common::Secret;
use futures::future::LocalBoxFuture;
use log::{debug, trace, warn};
use stripe_tools::{verify_event, WebhookError, STRIPE_SIGNATURE_HEADER};

use crate::errors::ServerError;

pub struct StripeSignatureFactory {
    secret: Secret<String>,
    tolerance: Duration,
}

impl StripeSignatureFactory {
    pub fn new(secret: Secret<String>, tolerance: Duration) -> Self {
        StripeSignatureFactory { secret, tolerance }
    }
}

impl<S, B> Transform<S, ServiceRequest> for StripeSignatureFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = StripeSignatureService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(StripeSignatureService {
            secret: self.secret.clone(),
            tolerance: self.tolerance,
            service: Rc::new(service),
        }))
    }
}

pub struct StripeSignatureService<S> {
    secret: Secret<String>,
    tolerance: Duration,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for StripeSignatureService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let secret = self.secret.clone();
        let tolerance = self.tolerance;
        Box::pin(async move {
            trace!("🔐️ Checking Stripe signature for request");
            let header = req
                .headers()
                .get(STRIPE_SIGNATURE_HEADER)
                .ok_or(WebhookError::MissingHeader)
                .and_then(|v| v.to_str().map_err(|e| WebhookError::MalformedHeader(e.to_string())))
                .map(String::from)
                .map_err(reject)?;
            let data = req.extract::<web::Bytes>().await.map_err(|e| {
                warn!("🔐️ Failed to extract request data: {e:?}");
                ServerError::InvalidRequest("Failed to extract request data.".into())
            })?;
            let event = verify_event(data.as_ref(), &header, &secret, tolerance).map_err(reject)?;
            debug!("🔐️ Stripe signature for event {} ({}) ✅️", event.id, event.event_type);
            req.extensions_mut().insert(event);
            req.set_payload(bytes_to_payload(data));
            service.call(req).await
        })
    }
}

fn reject(e: WebhookError) -> Error {
    match &e {
        WebhookError::InvalidSignature | WebhookError::StaleTimestamp { .. } => {
            warn!("🔐️ Rejecting webhook delivery. {e}")
        },
        _ => debug!("🔐️ Rejecting webhook delivery. {e}"),
    }
    ServerError::WebhookRejected(e).into()
}

fn bytes_to_payload(buf: web::Bytes) -> Payload {
    let (_, mut pl) = h1::Payload::create(true);
    pl.unread_data(buf);
    Payload::from(pl)
}
