use std::{collections::HashMap, fmt::Display};

use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderId, ShippingAddress};

/// The state of a payment intent as reported by the payment provider, at the moment it succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntentSnapshot {
    pub id: String,
    /// In minor units
    pub amount: i64,
    pub currency: String,
    pub metadata: HashMap<String, String>,
    pub shipping: Option<ShippingAddress>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentEventKind {
    Succeeded(PaymentIntentSnapshot),
    Failed { payment_intent_id: String, reason: Option<String> },
    /// Any other event type. Acknowledged and otherwise ignored.
    Other(String),
}

/// A verified, provider-agnostic payment notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentEvent {
    pub event_id: String,
    pub kind: PaymentEventKind,
}

impl PaymentEvent {
    pub fn succeeded<S: Into<String>>(event_id: S, intent: PaymentIntentSnapshot) -> Self {
        Self { event_id: event_id.into(), kind: PaymentEventKind::Succeeded(intent) }
    }

    pub fn failed<S: Into<String>>(event_id: S, payment_intent_id: S, reason: Option<String>) -> Self {
        Self {
            event_id: event_id.into(),
            kind: PaymentEventKind::Failed { payment_intent_id: payment_intent_id.into(), reason },
        }
    }

    pub fn other<S: Into<String>>(event_id: S, event_type: S) -> Self {
        Self { event_id: event_id.into(), kind: PaymentEventKind::Other(event_type.into()) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventOutcome {
    /// A new order was created.
    Materialized(Order),
    /// An order for this payment intent already existed. Nothing changed.
    Duplicate(OrderId),
    /// The payment failed. No order was created.
    FailureNoted(OrderId),
    /// The event type is not one we act on.
    Ignored(String),
}

impl Display for EventOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventOutcome::Materialized(order) => write!(f, "Order {} created", order.order_id),
            EventOutcome::Duplicate(oid) => write!(f, "Order {oid} already exists"),
            EventOutcome::FailureNoted(oid) => write!(f, "Payment {oid} failed"),
            EventOutcome::Ignored(event_type) => write!(f, "Event type {event_type} ignored"),
        }
    }
}
