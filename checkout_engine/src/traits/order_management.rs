use thiserror::Error;

use crate::{
    db_types::{NewOrder, Order, OrderId},
    order_objects::OrderQueryFilter,
    traits::InsertOrderResult,
};

#[derive(Debug, Clone, Error)]
pub enum OrderStoreError {
    #[error("Order store error: {0}")]
    DatabaseError(String),
    #[error("Stored order {0} is corrupt: {1}")]
    DataIntegrityError(String, String),
    #[error("Could not serialize order {0}: {1}")]
    SerializationError(String, String),
}

impl From<sqlx::Error> for OrderStoreError {
    fn from(e: sqlx::Error) -> Self {
        OrderStoreError::DatabaseError(e.to_string())
    }
}

#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, OrderStoreError>;

    /// Stores the order, unless an order with the same `order_id` already exists.
    ///
    /// Check-and-create must be a single atomic operation. Two concurrent calls with the same `order_id` must result
    /// in exactly one `Inserted` and one `AlreadyExists`, never two rows and never an error for the loser.
    async fn insert_order(&self, order: NewOrder) -> Result<InsertOrderResult, OrderStoreError>;

    /// Fetches orders matching the filter, oldest first.
    async fn fetch_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderStoreError>;
}
