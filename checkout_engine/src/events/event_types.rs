use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderId};

/// Published once per order, right after the order has been stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderMaterializedEvent {
    pub order: Order,
}

impl OrderMaterializedEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentFailedEvent {
    pub payment_intent_id: OrderId,
    pub reason: Option<String>,
}

impl PaymentFailedEvent {
    pub fn new(payment_intent_id: OrderId, reason: Option<String>) -> Self {
        Self { payment_intent_id, reason }
    }
}
