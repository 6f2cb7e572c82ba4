//! # Checkout engine public API
//!
//! The `cko_api` module exposes the programmatic API of the checkout engine. A purchase happens in two halves:
//!
//! * [`checkout_api`] is the synchronous half. It validates the buyer's details, prices the cart through
//!   [`pricing_api`] and asks a [`checkout_objects::PaymentAuthorizer`] for a payment intent that carries a snapshot of
//!   the priced order in its metadata.
//! * [`order_flow_api`] is the asynchronous half. It consumes verified payment events and creates exactly one order
//!   per successful payment intent, using only the snapshot.
//!
//! The other submodules hold the request, result and error types shared by both halves.
//!
//! # API usage
//!
//! Every API is created by supplying a backend that implements the traits it needs:
//!
//! ```rust,ignore
//! use checkout_engine::{CheckoutApi, PricingApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! // SqliteDatabase implements CatalogManagement and CustomerManagement
//! let api = CheckoutApi::new(PricingApi::new(db), my_authorizer);
//! let result = api.checkout(request).await?;
//! ```

pub mod checkout_api;
pub mod checkout_objects;
pub mod errors;
pub mod order_flow_api;
pub mod order_objects;
pub mod payment_objects;
pub mod pricing_api;
