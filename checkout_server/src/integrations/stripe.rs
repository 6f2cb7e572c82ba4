//! Glue between Stripe and the checkout engine.
//!
//! * [`StripeAuthorizer`] lets the engine open payment intents on Stripe.
//! * [`payment_event_from_stripe`] turns a verified Stripe event into the engine's provider-agnostic [`PaymentEvent`].
//! * [`create_confirmation_handlers`] subscribes to the engine's order events and sends out buyer confirmations.
use checkout_engine::{
    checkout_objects::{PaymentAuthorizer, PaymentIntentRef, PaymentIntentRequest, ShippingDetails},
    db_types::ShippingAddress,
    events::{EventHandlers, EventHooks, OrderMaterializedEvent, PaymentFailedEvent},
    AuthorizationError,
    PaymentEvent,
    PaymentIntentSnapshot,
};
use futures::future::BoxFuture;
use log::*;
use stripe_tools::{
    data_objects::PaymentError,
    Address,
    NewPaymentIntent,
    Shipping,
    StripeApi,
    StripeApiError,
    StripeEvent,
};

pub const PAYMENT_INTENT_SUCCEEDED: &str = "payment_intent.succeeded";
pub const PAYMENT_INTENT_PAYMENT_FAILED: &str = "payment_intent.payment_failed";
/// Older API versions used this name.
pub const PAYMENT_INTENT_FAILED: &str = "payment_intent.failed";

//--------------------------------------    StripeAuthorizer    --------------------------------------------------------
#[derive(Clone)]
pub struct StripeAuthorizer {
    api: StripeApi,
}

impl StripeAuthorizer {
    pub fn new(api: StripeApi) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &StripeApi {
        &self.api
    }
}

impl PaymentAuthorizer for StripeAuthorizer {
    async fn authorize(&self, request: PaymentIntentRequest) -> Result<PaymentIntentRef, AuthorizationError> {
        let new_intent = new_payment_intent(&request)?;
        let intent = self.api.create_payment_intent(&new_intent).await.map_err(|e| {
            warn!("💳️ Stripe refused to create a payment intent. {e}");
            AuthorizationError::AuthorizationFailed(e.to_string())
        })?;
        let client_secret = intent.client_secret.ok_or_else(|| {
            AuthorizationError::AuthorizationFailed(format!("Payment intent {} has no client secret", intent.id))
        })?;
        Ok(PaymentIntentRef {
            id: intent.id,
            client_secret,
            amount: intent.amount,
            currency: intent.currency,
            metadata: intent.metadata,
        })
    }
}

/// Builds the Stripe request. The amount is converted to minor units, truncating any fraction of a cent.
pub fn new_payment_intent(request: &PaymentIntentRequest) -> Result<NewPaymentIntent, AuthorizationError> {
    let amount =
        request.amount.to_minor_units().map_err(|e| AuthorizationError::AuthorizationFailed(e.to_string()))?;
    let intent = NewPaymentIntent::new(amount, &request.currency)
        .with_metadata(request.metadata.clone())
        .with_shipping(shipping_for(&request.shipping));
    Ok(intent)
}

pub fn shipping_for(details: &ShippingDetails) -> Shipping {
    let a = &details.address;
    let non_blank = |s: &str| Some(s.trim().to_string()).filter(|s| !s.is_empty());
    Shipping {
        name: non_blank(&details.full_name()),
        address: Address {
            line1: non_blank(&a.line1),
            line2: a.line2.as_deref().and_then(non_blank),
            city: non_blank(&a.city),
            state: a.state.as_deref().and_then(non_blank),
            postal_code: non_blank(&a.postal_code),
            country: non_blank(&a.country),
        },
        phone: None,
    }
}

pub fn shipping_address_from(shipping: Shipping) -> ShippingAddress {
    let Address { line1, line2, city, state, postal_code, country } = shipping.address;
    ShippingAddress {
        line1: line1.unwrap_or_default(),
        line2,
        city: city.unwrap_or_default(),
        state,
        postal_code: postal_code.unwrap_or_default(),
        country: country.unwrap_or_default(),
    }
}

//--------------------------------------     Event mapping      --------------------------------------------------------
/// Maps a verified Stripe event onto a [`PaymentEvent`].
///
/// `payment_intent.succeeded` carries the intent snapshot the order is built from. Both failure event names map to a
/// failure. Every other event type is passed on as `Other` and will be acknowledged without further action.
pub fn payment_event_from_stripe(event: StripeEvent) -> Result<PaymentEvent, StripeApiError> {
    match event.event_type.as_str() {
        PAYMENT_INTENT_SUCCEEDED => {
            let intent = event.payment_intent()?;
            let snapshot = PaymentIntentSnapshot {
                id: intent.id,
                amount: intent.amount,
                currency: intent.currency,
                metadata: intent.metadata,
                shipping: intent.shipping.map(shipping_address_from),
            };
            Ok(PaymentEvent::succeeded(event.id, snapshot))
        },
        PAYMENT_INTENT_PAYMENT_FAILED | PAYMENT_INTENT_FAILED => {
            let intent = event.payment_intent()?;
            let reason = intent.last_payment_error.and_then(failure_reason);
            Ok(PaymentEvent::failed(event.id, intent.id, reason))
        },
        _ => Ok(PaymentEvent::other(event.id, event.event_type)),
    }
}

fn failure_reason(e: PaymentError) -> Option<String> {
    match (e.code, e.message) {
        (Some(code), Some(msg)) => Some(format!("{code}: {msg}")),
        (code, msg) => msg.or(code),
    }
}

//--------------------------------------  Confirmation hooks    --------------------------------------------------------
pub const CONFIRMATION_EVENT_BUFFER_SIZE: usize = 25;

/// Subscribes to order events to let buyers know what happened to their payment.
///
/// Mail delivery is an external service. For now the confirmation is written to the log under the
/// `cko::confirmations` target, where a mail relay can pick it up. Failures here never affect the webhook response.
pub fn create_confirmation_handlers() -> EventHandlers {
    let mut hooks = EventHooks::default();
    hooks.on_order_materialized(on_order_materialized).on_payment_failed(on_payment_failed);
    EventHandlers::new(CONFIRMATION_EVENT_BUFFER_SIZE, hooks)
}

fn on_order_materialized(ev: OrderMaterializedEvent) -> BoxFuture<'static, ()> {
    let OrderMaterializedEvent { order } = ev;
    Box::pin(async move {
        let lines = order
            .items
            .iter()
            .map(|l| format!("{} x {} ({}) @ {}", l.quantity, l.name, l.variant, l.unit_price))
            .collect::<Vec<_>>()
            .join("; ");
        info!(
            target: "cko::confirmations",
            "📧️ Order confirmation to {} <{}>: order {} for {} {}. {lines}",
            order.buyer_name,
            order.email,
            order.order_id,
            order.grand_total,
            order.currency.to_uppercase()
        );
    })
}

fn on_payment_failed(ev: PaymentFailedEvent) -> BoxFuture<'static, ()> {
    Box::pin(async move {
        info!(
            target: "cko::confirmations",
            "📧️ Payment {} failed. {}",
            ev.payment_intent_id,
            ev.reason.unwrap_or_else(|| "No reason given".into())
        );
    })
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use checkout_engine::PaymentEventKind;
    use cko_common::Money;
    use rust_decimal_macros::dec;

    use super::*;

    fn event(event_type: &str, object: &str) -> StripeEvent {
        let json = format!(r#"{{"id":"evt_1","type":"{event_type}","created":1700000000,"data":{{"object":{object}}}}}"#);
        serde_json::from_str(&json).unwrap()
    }

    const INTENT: &str = r#"{
        "id": "pi_123", "object": "payment_intent", "amount": 33250, "currency": "usd", "status": "succeeded",
        "metadata": { "items_chunks": "1" },
        "shipping": { "name": "Jane Doe", "address": { "line1": "1 Elm St", "city": "Springfield",
                      "postal_code": "12345", "country": "US" } },
        "last_payment_error": { "code": "card_declined", "message": "Your card was declined." }
    }"#;

    #[test]
    fn succeeded_events_carry_the_snapshot() {
        let ev = payment_event_from_stripe(event("payment_intent.succeeded", INTENT)).unwrap();
        assert_eq!(ev.event_id, "evt_1");
        let PaymentEventKind::Succeeded(snapshot) = ev.kind else {
            panic!("Expected a successful payment");
        };
        assert_eq!(snapshot.id, "pi_123");
        assert_eq!(snapshot.amount, 33250);
        assert_eq!(snapshot.metadata["items_chunks"], "1");
        let address = snapshot.shipping.unwrap();
        assert_eq!(address.city, "Springfield");
        assert_eq!(address.line2, None);
    }

    #[test]
    fn both_failure_names_are_failures() {
        for name in ["payment_intent.payment_failed", "payment_intent.failed"] {
            let ev = payment_event_from_stripe(event(name, INTENT)).unwrap();
            assert_eq!(
                ev.kind,
                PaymentEventKind::Failed {
                    payment_intent_id: "pi_123".into(),
                    reason: Some("card_declined: Your card was declined.".into())
                }
            );
        }
    }

    #[test]
    fn other_events_are_passed_through() {
        let ev = payment_event_from_stripe(event("charge.succeeded", r#"{"id":"ch_1","object":"charge"}"#)).unwrap();
        assert_eq!(ev.kind, PaymentEventKind::Other("charge.succeeded".into()));
        let err = payment_event_from_stripe(event("payment_intent.succeeded", r#"{"id":"ch_1","object":"charge"}"#));
        assert!(err.is_err());
    }

    #[test]
    fn payment_intent_requests_truncate_to_cents() {
        let details = ShippingDetails {
            name: "Jane".into(),
            lastname: "Doe".into(),
            email: "jane@example.com".into(),
            address: ShippingAddress {
                line1: "1 Elm St".into(),
                line2: Some(" ".into()),
                city: "Springfield".into(),
                state: None,
                postal_code: "12345".into(),
                country: "US".into(),
            },
        };
        let request = PaymentIntentRequest {
            amount: Money::from(dec!(332.509)),
            currency: "USD".into(),
            metadata: HashMap::from([("email".to_string(), "jane@example.com".to_string())]),
            shipping: details,
        };
        let intent = new_payment_intent(&request).unwrap();
        assert_eq!(intent.amount, 33250);
        assert_eq!(intent.currency, "usd");
        assert_eq!(intent.metadata["email"], "jane@example.com");
        let shipping = intent.shipping.unwrap();
        assert_eq!(shipping.name.as_deref(), Some("Jane Doe"));
        assert_eq!(shipping.address.line2, None);
    }
}
