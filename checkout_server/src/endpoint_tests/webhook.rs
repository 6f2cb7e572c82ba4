use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use checkout_engine::{
    checkout_objects::{OrderMetadata, PricedCart, PricedLine, ShippingDetails},
    db_types::{NewOrder, Order, OrderId, OrderStatusType, ShippingAddress},
    events::EventProducers,
    traits::{InsertOrderResult, OrderStoreError},
    OrderFlowApi,
};
use chrono::{Duration, Utc};
use cko_common::{Money, Secret};
use mockall::predicate::eq;
use serde_json::json;
use stripe_tools::STRIPE_SIGNATURE_HEADER;

use super::{
    helpers::{send_request, signature_header, signed_webhook_request, WEBHOOK_SECRET},
    mocks::MockOrderManager,
};
use crate::{data_objects::JsonResponse, middleware::StripeSignatureFactory, routes::StripeWebhookRoute};

const INTENT_ID: &str = "pi_3PqRstUvWxYz";

fn configure(db: MockOrderManager) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = OrderFlowApi::new(db, EventProducers::default());
        let scope = web::scope("/stripe")
            .wrap(StripeSignatureFactory::new(Secret::new(WEBHOOK_SECRET.to_string()), Duration::minutes(5)))
            .service(StripeWebhookRoute::<MockOrderManager>::new());
        cfg.app_data(web::Data::new(api)).service(scope);
    }
}

fn order_metadata() -> serde_json::Value {
    let line = PricedLine {
        item_id: "A".into(),
        name: "Widget".into(),
        variant: "Base".into(),
        unit_price: Money::from(100),
        quantity: 2,
        line_total: Money::from(200),
    };
    let cart = PricedCart {
        lines: vec![line],
        subtotal: Money::from(200),
        discount: Money::default(),
        grand_total: Money::from(200),
        customer_id: None,
    };
    let shipping = ShippingDetails {
        name: "Jane".into(),
        lastname: "Doe".into(),
        email: "jane@example.com".into(),
        address: ShippingAddress::default(),
    };
    let metadata = OrderMetadata::new(&cart, &shipping).encode().unwrap();
    serde_json::to_value(metadata).unwrap()
}

fn event_payload(event_type: &str, metadata: serde_json::Value) -> String {
    json!({
        "id": "evt_1PqRst",
        "type": event_type,
        "created": 1_700_000_000,
        "livemode": false,
        "data": { "object": {
            "id": INTENT_ID,
            "object": "payment_intent",
            "amount": 20000,
            "currency": "usd",
            "status": "succeeded",
            "metadata": metadata,
            "shipping": { "name": "Jane Doe", "address": {
                "line1": "1 Elm St", "city": "Springfield", "postal_code": "12345", "country": "US" } },
            "last_payment_error": { "code": "card_declined", "message": "Your card was declined." }
        }}
    })
    .to_string()
}

fn stored(order: NewOrder) -> Order {
    Order {
        id: 1,
        order_id: order.order_id,
        customer_id: order.customer_id,
        buyer_name: order.buyer_name,
        email: order.email,
        items: order.items,
        grand_total: order.grand_total,
        discount: order.discount,
        currency: order.currency,
        shipping_address: order.shipping_address,
        status: order.status,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn order_manager_without_calls() -> MockOrderManager {
    let mut db = MockOrderManager::new();
    db.expect_fetch_order_by_order_id().times(0);
    db.expect_insert_order().times(0);
    db
}

#[actix_web::test]
async fn successful_payment_creates_the_order() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderManager::new();
    db.expect_fetch_order_by_order_id().with(eq(OrderId::new(INTENT_ID))).times(1).returning(|_| Ok(None));
    db.expect_insert_order()
        .withf(|order| {
            order.order_id.as_str() == INTENT_ID &&
                order.grand_total == Money::from(200) &&
                order.email == "jane@example.com" &&
                order.shipping_address.city == "Springfield"
        })
        .times(1)
        .returning(|order| Ok(InsertOrderResult::Inserted(stored(order))));
    let payload = event_payload("payment_intent.succeeded", order_metadata());
    let (status, body) = send_request(signed_webhook_request(&payload), configure(db)).await;
    assert_eq!(status, StatusCode::OK);
    let response: JsonResponse = serde_json::from_str(&body).unwrap();
    assert!(response.success);
    assert_eq!(response.message, format!("Order {INTENT_ID} created"));
}

#[actix_web::test]
async fn redelivered_payment_is_acknowledged() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderManager::new();
    db.expect_fetch_order_by_order_id().times(1).returning(|oid| {
        let existing = NewOrder {
            order_id: oid.clone(),
            customer_id: None,
            buyer_name: "Jane Doe".into(),
            email: "jane@example.com".into(),
            items: vec![],
            grand_total: Money::from(200),
            discount: Money::default(),
            currency: "usd".into(),
            shipping_address: ShippingAddress::default(),
            status: OrderStatusType::Succeeded,
        };
        Ok(Some(stored(existing)))
    });
    db.expect_insert_order().times(0);
    let payload = event_payload("payment_intent.succeeded", order_metadata());
    let (status, body) = send_request(signed_webhook_request(&payload), configure(db)).await;
    assert_eq!(status, StatusCode::OK);
    let response: JsonResponse = serde_json::from_str(&body).unwrap();
    assert!(response.success);
    assert_eq!(response.message, format!("Order {INTENT_ID} already exists"));
}

#[actix_web::test]
async fn store_failure_asks_for_redelivery() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderManager::new();
    db.expect_fetch_order_by_order_id()
        .times(1)
        .returning(|_| Err(OrderStoreError::DatabaseError("database is locked".into())));
    db.expect_insert_order().times(0);
    let payload = event_payload("payment_intent.succeeded", order_metadata());
    let (status, body) = send_request(signed_webhook_request(&payload), configure(db)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("database is locked"), "{body}");
}

#[actix_web::test]
async fn unusable_metadata_is_acknowledged_without_an_order() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderManager::new();
    db.expect_fetch_order_by_order_id().times(1).returning(|_| Ok(None));
    db.expect_insert_order().times(0);
    let payload = event_payload("payment_intent.succeeded", json!({ "email": "jane@example.com" }));
    let (status, body) = send_request(signed_webhook_request(&payload), configure(db)).await;
    assert_eq!(status, StatusCode::OK);
    let response: JsonResponse = serde_json::from_str(&body).unwrap();
    assert!(!response.success);
}

#[actix_web::test]
async fn failed_payment_creates_no_order() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderManager::new();
    db.expect_fetch_order_by_order_id().times(1).returning(|_| Ok(None));
    db.expect_insert_order().times(0);
    let payload = event_payload("payment_intent.payment_failed", order_metadata());
    let (status, body) = send_request(signed_webhook_request(&payload), configure(db)).await;
    assert_eq!(status, StatusCode::OK);
    let response: JsonResponse = serde_json::from_str(&body).unwrap();
    assert_eq!(response.message, format!("Payment {INTENT_ID} failed"));
}

#[actix_web::test]
async fn other_event_types_are_ignored() {
    let _ = env_logger::try_init().ok();
    let payload = event_payload("payment_intent.created", order_metadata());
    let (status, body) = send_request(signed_webhook_request(&payload), configure(order_manager_without_calls())).await;
    assert_eq!(status, StatusCode::OK);
    let response: JsonResponse = serde_json::from_str(&body).unwrap();
    assert!(response.success);
    assert_eq!(response.message, "Event type payment_intent.created ignored");
}

#[actix_web::test]
async fn invalid_signature_is_rejected() {
    let _ = env_logger::try_init().ok();
    let payload = event_payload("payment_intent.succeeded", order_metadata());
    let header = signature_header(&payload, Utc::now().timestamp());
    // Sign one body, send another
    let tampered = payload.replace("20000", "1");
    let req = TestRequest::post()
        .uri("/stripe/webhook")
        .insert_header((STRIPE_SIGNATURE_HEADER, header))
        .set_payload(tampered);
    let (status, _) = send_request(req, configure(order_manager_without_calls())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn stale_signature_is_rejected() {
    let _ = env_logger::try_init().ok();
    let payload = event_payload("payment_intent.succeeded", order_metadata());
    let header = signature_header(&payload, Utc::now().timestamp() - 3600);
    let req =
        TestRequest::post().uri("/stripe/webhook").insert_header((STRIPE_SIGNATURE_HEADER, header)).set_payload(payload);
    let (status, _) = send_request(req, configure(order_manager_without_calls())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn missing_or_malformed_signature_header() {
    let _ = env_logger::try_init().ok();
    let payload = event_payload("payment_intent.succeeded", order_metadata());
    let req = TestRequest::post().uri("/stripe/webhook").set_payload(payload.clone());
    let (status, _) = send_request(req, configure(order_manager_without_calls())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let req = TestRequest::post()
        .uri("/stripe/webhook")
        .insert_header((STRIPE_SIGNATURE_HEADER, "v1=deadbeef"))
        .set_payload(payload);
    let (status, _) = send_request(req, configure(order_manager_without_calls())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn signed_garbage_is_a_bad_request() {
    let _ = env_logger::try_init().ok();
    let (status, _) =
        send_request(signed_webhook_request("{\"not\": \"an event\"}"), configure(order_manager_without_calls())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
