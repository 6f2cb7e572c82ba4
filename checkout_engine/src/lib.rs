//! Checkout Engine
//!
//! The checkout engine turns a shopping cart into a paid order. It is provider-agnostic: payment authorization is
//! reached through the [`PaymentAuthorizer`] trait and payment notifications arrive as [`PaymentEvent`]s that the
//! caller has already verified.
//!
//! The library is divided into three main sections:
//! 1. Backend contracts ([`mod@traits`]) and the SQLite backend that implements them ([`mod@sqlite`]). The data types
//!    that are stored are defined in [`mod@db_types`] and are public.
//! 2. The public API ([`mod@cko_api`]): pricing, checkout and the order flow that materializes orders from successful
//!    payments.
//! 3. Events ([`mod@events`]). When an order is materialized or a payment fails, an event is published. Subscribers,
//!    e.g. a confirmation mailer, hook into these without holding up the order flow.
pub mod cko_api;
pub mod db_types;
pub mod events;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use cko_api::{
    checkout_api::CheckoutApi,
    checkout_objects::{self, PaymentAuthorizer},
    errors::{AuthorizationError, CheckoutError, MetadataError, OrderFlowError, PricingError},
    order_flow_api::OrderFlowApi,
    order_objects,
    payment_objects::{self, EventOutcome, PaymentEvent, PaymentEventKind, PaymentIntentSnapshot},
    pricing_api::PricingApi,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{
    CatalogError,
    CatalogManagement,
    CustomerError,
    CustomerManagement,
    InsertOrderResult,
    OrderManagement,
    OrderStoreError,
    PricingDatabase,
};
