use std::fmt::Debug;

use log::*;

use crate::{
    cko_api::{
        checkout_objects::OrderMetadata,
        errors::OrderFlowError,
        payment_objects::{EventOutcome, PaymentEvent, PaymentEventKind, PaymentIntentSnapshot},
    },
    db_types::{NewOrder, Order, OrderId, OrderStatusType},
    events::{EventProducers, OrderMaterializedEvent, PaymentFailedEvent},
    traits::{InsertOrderResult, OrderManagement},
};

/// `OrderFlowApi` is the asynchronous half of a purchase. It consumes verified payment events and turns each
/// successful payment into exactly one order.
///
/// Per payment intent the flow is:
///
/// | Current state | Event      | Result                                         |
/// |---------------|------------|------------------------------------------------|
/// | no order      | succeeded  | order created, `OrderMaterialized` published   |
/// | no order      | failed     | logged, `PaymentFailed` published, no order    |
/// | order exists  | any        | no-op                                          |
/// | any           | other type | acknowledged, no-op                            |
///
/// There is no separate log of processed events. Redeliveries are caught by the order store's uniqueness rule on the
/// payment intent id.
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> OrderFlowApi<B>
where B: OrderManagement
{
    pub async fn process_payment_event(&self, event: PaymentEvent) -> Result<EventOutcome, OrderFlowError> {
        let PaymentEvent { event_id, kind } = event;
        match kind {
            PaymentEventKind::Succeeded(intent) => self.process_successful_payment(&event_id, intent).await,
            PaymentEventKind::Failed { payment_intent_id, reason } => {
                self.process_failed_payment(&event_id, payment_intent_id, reason).await
            },
            PaymentEventKind::Other(event_type) => {
                debug!("🔄️ Event {event_id} of type {event_type} needs no action");
                Ok(EventOutcome::Ignored(event_type))
            },
        }
    }

    async fn process_successful_payment(
        &self,
        event_id: &str,
        intent: PaymentIntentSnapshot,
    ) -> Result<EventOutcome, OrderFlowError> {
        let order_id = OrderId::new(intent.id.clone());
        if let Some(existing) = self.db.fetch_order_by_order_id(&order_id).await? {
            info!("🔄️📦️ Event {event_id}: order {order_id} already exists (#{}). Ignoring redelivery.", existing.id);
            return Ok(EventOutcome::Duplicate(order_id));
        }
        let charged = intent.amount;
        let new_order = new_order_from_intent(intent)?;
        if new_order.grand_total.to_minor_units().ok() != Some(charged) {
            warn!(
                "🔄️📦️ Payment {order_id} charged {charged} minor units but its metadata totals {}. Storing the order \
                 as snapshotted.",
                new_order.grand_total
            );
        }
        match self.db.insert_order(new_order).await? {
            InsertOrderResult::Inserted(order) => {
                info!(
                    "🔄️📦️ Event {event_id}: order {order_id} created for {} {} ({} lines)",
                    order.grand_total,
                    order.currency,
                    order.items.len()
                );
                self.call_order_materialized_hook(&order).await;
                Ok(EventOutcome::Materialized(order))
            },
            InsertOrderResult::AlreadyExists(id) => {
                info!("🔄️📦️ Event {event_id}: order {order_id} was created concurrently (#{id}). Nothing to do.");
                Ok(EventOutcome::Duplicate(order_id))
            },
        }
    }

    async fn process_failed_payment(
        &self,
        event_id: &str,
        payment_intent_id: String,
        reason: Option<String>,
    ) -> Result<EventOutcome, OrderFlowError> {
        let order_id = OrderId::new(payment_intent_id);
        let reason_str = reason.as_deref().unwrap_or("no reason given");
        match self.db.fetch_order_by_order_id(&order_id).await? {
            Some(order) => {
                warn!(
                    "🔄️❌️ Event {event_id}: payment {order_id} reported as failed ({reason_str}), but order #{} exists \
                     already. The order is left untouched.",
                    order.id
                );
                Ok(EventOutcome::Duplicate(order_id))
            },
            None => {
                info!("🔄️❌️ Event {event_id}: payment {order_id} failed. {reason_str}");
                self.call_payment_failed_hook(&order_id, reason).await;
                Ok(EventOutcome::FailureNoted(order_id))
            },
        }
    }

    async fn call_order_materialized_hook(&self, order: &Order) {
        for emitter in &self.producers.order_materialized_producer {
            debug!("🔄️📦️ Notifying order materialized hook subscribers");
            emitter.publish_event(OrderMaterializedEvent::new(order.clone())).await;
        }
    }

    async fn call_payment_failed_hook(&self, order_id: &OrderId, reason: Option<String>) {
        for emitter in &self.producers.payment_failed_producer {
            debug!("🔄️❌️ Notifying payment failed hook subscribers");
            emitter.publish_event(PaymentFailedEvent::new(order_id.clone(), reason.clone())).await;
        }
    }
}

/// Builds the order purely from the payment's snapshot. The catalog is never consulted here.
fn new_order_from_intent(intent: PaymentIntentSnapshot) -> Result<NewOrder, OrderFlowError> {
    let invalid = |reason: String| OrderFlowError::InvalidMetadata { payment_intent_id: intent.id.clone(), reason };
    let meta = OrderMetadata::decode(&intent.metadata).map_err(|e| invalid(e.to_string()))?;
    let shipping_address = intent.shipping.clone().ok_or_else(|| invalid("No shipping address".into()))?;
    if meta.items.is_empty() {
        return Err(invalid("The order has no line items".into()));
    }
    let buyer_name = meta.buyer_name();
    Ok(NewOrder {
        order_id: OrderId::new(intent.id.clone()),
        customer_id: meta.customer_id,
        buyer_name,
        email: meta.email,
        items: meta.items,
        grand_total: meta.grand_total,
        discount: meta.discount,
        currency: intent.currency.to_lowercase(),
        shipping_address,
        status: OrderStatusType::Succeeded,
    })
}
