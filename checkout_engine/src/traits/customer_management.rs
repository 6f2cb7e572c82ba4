use thiserror::Error;

use crate::db_types::Customer;

#[derive(Debug, Clone, Error)]
pub enum CustomerError {
    #[error("Customer backend error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for CustomerError {
    fn from(e: sqlx::Error) -> Self {
        CustomerError::DatabaseError(e.to_string())
    }
}

#[allow(async_fn_in_trait)]
pub trait CustomerManagement {
    /// Returns `None` if there is no customer with the given id. That is not an error: the buyer is a guest.
    async fn fetch_customer(&self, customer_id: &str) -> Result<Option<Customer>, CustomerError>;
}
