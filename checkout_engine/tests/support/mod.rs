#![allow(dead_code)]
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
        Mutex,
    },
};

use checkout_engine::{
    checkout_objects::{
        CartLine,
        OrderMetadata,
        PaymentAuthorizer,
        PaymentIntentRef,
        PaymentIntentRequest,
        ShippingDetails,
    },
    db_types::ShippingAddress,
    test_utils::{
        prepare_env::{prepare_test_env, random_db_path},
        seed::seed_database,
    },
    AuthorizationError,
    PaymentIntentSnapshot,
    PricingApi,
    SqliteDatabase,
};
use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};

pub async fn setup() -> SqliteDatabase {
    let url = random_db_path();
    let db = prepare_test_env(&url).await;
    seed_database(&db).await;
    db
}

pub async fn tear_down(mut db: SqliteDatabase) {
    db.close().await;
    if let Err(e) = Sqlite::drop_database(db.url()).await {
        error!("🚀️ Failed to drop database {}: {e}", db.url());
    }
}

pub fn shipping() -> ShippingDetails {
    ShippingDetails {
        name: "Jane".into(),
        lastname: "Doe".into(),
        email: "jane@example.com".into(),
        address: ShippingAddress {
            line1: "1234 Elm Street".into(),
            line2: Some("Apt 5".into()),
            city: "Springfield".into(),
            state: Some("IL".into()),
            postal_code: "62701".into(),
            country: "US".into(),
        },
    }
}

/// Two `A`s at 100.00 and one 16GB `B` at 150.00
pub fn sample_cart() -> Vec<CartLine> {
    vec![CartLine::new("A", 2), CartLine::new("B", 1).with_variant("16GB")]
}

/// Stands in for the payment provider. Records every request and hands out sequential intent ids.
#[derive(Clone, Default)]
pub struct FakeAuthorizer {
    calls: Arc<AtomicUsize>,
    last_request: Arc<Mutex<Option<PaymentIntentRequest>>>,
    fail: bool,
}

impl FakeAuthorizer {
    pub fn failing() -> Self {
        Self { fail: true, ..Default::default() }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<PaymentIntentRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

impl PaymentAuthorizer for FakeAuthorizer {
    async fn authorize(&self, request: PaymentIntentRequest) -> Result<PaymentIntentRef, AuthorizationError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        if self.fail {
            return Err(AuthorizationError::AuthorizationFailed("card declined".into()));
        }
        let amount = request
            .amount
            .to_minor_units()
            .map_err(|e| AuthorizationError::AuthorizationFailed(e.to_string()))?;
        Ok(PaymentIntentRef {
            id: format!("pi_test_{n:04}"),
            client_secret: format!("pi_test_{n:04}_secret"),
            amount,
            currency: request.currency,
            metadata: request.metadata,
        })
    }
}

/// Prices `lines` against the current catalog and returns what the payment provider would report once the payment
/// for it succeeded.
pub async fn paid_intent(
    db: &SqliteDatabase,
    intent_id: &str,
    lines: &[CartLine],
    customer_id: Option<&str>,
) -> PaymentIntentSnapshot {
    let pricing = PricingApi::new(db.clone());
    let cart = pricing.price_cart(lines, customer_id).await.expect("Error pricing cart");
    let details = shipping();
    let metadata: HashMap<String, String> =
        OrderMetadata::new(&cart, &details).encode().expect("Error encoding metadata");
    PaymentIntentSnapshot {
        id: intent_id.to_string(),
        amount: cart.grand_total.to_minor_units().unwrap(),
        currency: "usd".into(),
        metadata,
        shipping: Some(details.address),
    }
}
