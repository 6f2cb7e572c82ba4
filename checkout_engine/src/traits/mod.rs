//! # Backend contracts
//!
//! These traits define what a storage backend has to provide for the checkout engine to work on top of it.
//!
//! * [`CatalogManagement`] is the read side of the product catalog. Pricing always reads it at call time.
//! * [`CustomerManagement`] resolves customer ids into known customers, mainly to decide on discount eligibility.
//! * [`OrderManagement`] is the order store. Its [`OrderManagement::insert_order`] is the single place where the
//!   "one order per payment intent" rule is enforced, so implementations must make it a conditional, atomic insert.
//!
//! [`PricingDatabase`] is a convenience bound for anything that can price a cart.
mod catalog_management;
mod customer_management;
mod order_management;

mod data_objects;

pub use catalog_management::{CatalogError, CatalogManagement};
pub use customer_management::{CustomerError, CustomerManagement};
pub use data_objects::InsertOrderResult;
pub use order_management::{OrderManagement, OrderStoreError};

/// Everything the pricing resolver needs from a backend.
pub trait PricingDatabase: CatalogManagement + CustomerManagement {}

impl<T> PricingDatabase for T where T: CatalogManagement + CustomerManagement {}
