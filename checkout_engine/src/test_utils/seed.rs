//! A small catalog and customer list shared by the integration tests.
use cko_common::Money;
use rust_decimal::Decimal;

use crate::{
    db_types::{CatalogItem, Customer},
    SqliteDatabase,
};

pub const MEMBER_ID: &str = "cust-alice";
pub const NON_MEMBER_ID: &str = "cust-bob";

/// `A` costs 100.00. `B` costs 120.00, or 150.00 as the "16GB" variant. `C` costs 19.99.
pub fn catalog() -> Vec<CatalogItem> {
    vec![
        CatalogItem::new("A", "Widget", Money::from(100)),
        CatalogItem::new("B", "Laptop", Money::from(120)).with_variant("16GB", Money::from(150)),
        CatalogItem::new("C", "Cable", Money::from(Decimal::new(1999, 2))),
    ]
}

pub fn customers() -> Vec<Customer> {
    let alice = Customer::new(MEMBER_ID, "Alice", "alice@example.com");
    let mut bob = Customer::new(NON_MEMBER_ID, "Bob", "bob@example.com");
    bob.discount_eligible = false;
    vec![alice, bob]
}

pub async fn seed_database(db: &SqliteDatabase) {
    for item in catalog() {
        db.upsert_item(&item).await.expect("Error seeding catalog");
    }
    for customer in customers() {
        db.upsert_customer(&customer).await.expect("Error seeding customers");
    }
}
