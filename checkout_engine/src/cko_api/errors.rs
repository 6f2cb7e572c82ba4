use thiserror::Error;

use crate::traits::{CatalogError, CustomerError, OrderStoreError};

/// Problems with the cart or the buyer's details. All of these are the client's to fix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    #[error("The cart is empty")]
    EmptyCart,
    #[error("Invalid quantity {quantity} for item {item_id}. Quantities must be at least 1")]
    InvalidQuantity { item_id: String, quantity: i64 },
    #[error("Item with ID {0} does not exist in the inventory")]
    ItemNotFound(String),
    #[error("The price for {0} is too large to be charged")]
    AmountTooLarge(String),
    #[error("Invalid shipping address provided. The {0} field is missing or invalid")]
    InvalidShippingAddress(String),
    #[error("Could not read the catalog. {0}")]
    BackendError(String),
}

impl From<CatalogError> for PricingError {
    fn from(e: CatalogError) -> Self {
        PricingError::BackendError(e.to_string())
    }
}

impl From<CustomerError> for PricingError {
    fn from(e: CustomerError) -> Self {
        PricingError::BackendError(e.to_string())
    }
}

/// The payment provider refused or failed to open a payment intent. Never retried automatically.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthorizationError {
    #[error("Payment authorization failed. {0}")]
    AuthorizationFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataError {
    #[error("The cart is too large to be attached to a payment. It needs {chunks} metadata chunks but at most {max} fit")]
    CartTooLarge { chunks: usize, max: usize },
    #[error("The {field} metadata value is {len} characters long. At most {max} are allowed")]
    ValueTooLong { field: String, len: usize, max: usize },
    #[error("Payment metadata is missing the {0} field")]
    MissingField(String),
    #[error("Payment metadata field {field} is invalid. {reason}")]
    InvalidField { field: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Pricing(#[from] PricingError),
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    #[error(transparent)]
    Authorization(#[from] AuthorizationError),
    #[error("The order total {0} cannot be charged")]
    InvalidAmount(String),
}

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    /// The order store failed. The event should be redelivered.
    #[error("Order store failure. {0}")]
    StoreError(#[from] OrderStoreError),
    /// The payment carries metadata that cannot be turned into an order. Redelivery will not help.
    #[error("Cannot build an order from payment {payment_intent_id}. {reason}")]
    InvalidMetadata { payment_intent_id: String, reason: String },
}

impl OrderFlowError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, OrderFlowError::StoreError(_))
    }
}
