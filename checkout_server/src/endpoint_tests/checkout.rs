use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use checkout_engine::{
    checkout_objects::{OrderMetadata, PaymentIntentRef},
    db_types::{CatalogItem, Customer},
    AuthorizationError,
    CheckoutApi,
    PricingApi,
};
use cko_common::Money;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;

use super::{
    helpers::send_request,
    mocks::{MockAuthorizer, MockPricingBackend},
};
use crate::{data_objects::CheckoutResponse, helpers::json_config, routes::CheckoutRoute};

fn configure(db: MockPricingBackend, authorizer: MockAuthorizer) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = CheckoutApi::new(PricingApi::new(db).with_member_discount(dec!(5)), authorizer).with_currency("USD");
        cfg.app_data(json_config())
            .app_data(web::Data::new(api))
            .service(CheckoutRoute::<MockPricingBackend, MockAuthorizer>::new());
    }
}

fn catalog() -> MockPricingBackend {
    let mut db = MockPricingBackend::new();
    db.expect_fetch_item().returning(|id| {
        let item = match id {
            "A" => Some(CatalogItem::new("A", "Widget", Money::from(100))),
            "B" => Some(CatalogItem::new("B", "Laptop", Money::from(120)).with_variant("16GB", Money::from(150))),
            _ => None,
        };
        Ok(item)
    });
    db.expect_fetch_customer().returning(|id| Ok((id == "member-1").then(|| Customer::new(id, "Jane", "jane@x.io"))));
    db
}

fn approving_authorizer() -> MockAuthorizer {
    let mut authorizer = MockAuthorizer::new();
    authorizer.expect_authorize().times(1).returning(|req| {
        Ok(PaymentIntentRef {
            id: "pi_test_0001".into(),
            client_secret: "pi_test_0001_secret_abc".into(),
            amount: req.amount.to_minor_units().unwrap(),
            currency: req.currency.clone(),
            metadata: req.metadata,
        })
    });
    authorizer
}

fn checkout_body(items: serde_json::Value, user_id: &str) -> serde_json::Value {
    json!({
        "name": "Jane", "lastname": "Doe", "email": "jane@example.com",
        "adress": "1 Elm St", "city": "Springfield", "postalcode": 12345, "country": "US",
        "item": items,
        "userId": user_id
    })
}

fn checkout_request(body: serde_json::Value) -> TestRequest {
    TestRequest::post().uri("/checkout").set_json(body)
}

#[actix_web::test]
async fn member_checkout() {
    let _ = env_logger::try_init().ok();
    let mut authorizer = MockAuthorizer::new();
    authorizer
        .expect_authorize()
        .withf(|req| {
            let meta = OrderMetadata::decode(&req.metadata).unwrap();
            req.amount == Money::from(dec!(332.50)) &&
                req.currency == "usd" &&
                meta.customer_id.as_deref() == Some("member-1") &&
                meta.items.len() == 2 &&
                req.shipping.address.postal_code == "12345"
        })
        .times(1)
        .returning(|req| {
            Ok(PaymentIntentRef {
                id: "pi_test_0001".into(),
                client_secret: "pi_test_0001_secret_abc".into(),
                amount: 33250,
                currency: req.currency.clone(),
                metadata: req.metadata,
            })
        });
    let items = json!([{ "itemID": "A", "amount": 2 }, { "itemID": "B", "amount": 1, "memory": "16GB" }]);
    let req = checkout_request(checkout_body(items, "member-1"));
    let (status, body) = send_request(req, configure(catalog(), authorizer)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let response: CheckoutResponse = serde_json::from_str(&body).unwrap();
    assert_eq!(response.subtotal, Money::from(350));
    assert_eq!(response.discount, Money::from(dec!(17.50)));
    assert_eq!(response.total_price, Money::from(dec!(332.50)));
    assert!(response.customer_exists);
    assert_eq!(response.payment_intent_id, "pi_test_0001");
    assert_eq!(response.client_secret, "pi_test_0001_secret_abc");
    assert_eq!(response.items[1].variant, "16GB");
    assert_eq!(response.items[1].unit_price, Money::from(150));
}

#[actix_web::test]
async fn guest_checkout_pays_full_price() {
    let _ = env_logger::try_init().ok();
    let items = json!([{ "itemID": "A", "amount": 2 }, { "itemID": "B", "amount": 1, "memory": "16GB" }]);
    let req = checkout_request(checkout_body(items, "someone-else"));
    let (status, body) = send_request(req, configure(catalog(), approving_authorizer())).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let response: CheckoutResponse = serde_json::from_str(&body).unwrap();
    assert_eq!(response.discount, Money::default());
    assert_eq!(response.total_price, Money::from(350));
    assert!(!response.customer_exists);
}

#[actix_web::test]
async fn invalid_quantity_never_reaches_the_provider() {
    let _ = env_logger::try_init().ok();
    let mut db = MockPricingBackend::new();
    db.expect_fetch_item().times(0);
    db.expect_fetch_customer().times(0);
    let mut authorizer = MockAuthorizer::new();
    authorizer.expect_authorize().times(0);
    let items = json!([{ "itemID": "A", "amount": 0 }]);
    let (status, body) = send_request(checkout_request(checkout_body(items, "")), configure(db, authorizer)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Invalid quantity"), "{body}");
}

#[actix_web::test]
async fn negative_quantity_never_reaches_the_provider() {
    let _ = env_logger::try_init().ok();
    let mut db = MockPricingBackend::new();
    db.expect_fetch_item().times(0);
    db.expect_fetch_customer().times(0);
    let mut authorizer = MockAuthorizer::new();
    authorizer.expect_authorize().times(0);
    let items = json!([{ "itemID": "A", "amount": 1 }, { "itemID": "B", "amount": -1 }]);
    let (status, body) = send_request(checkout_request(checkout_body(items, "")), configure(db, authorizer)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Invalid quantity -1 for item B"), "{body}");
}

#[actix_web::test]
async fn oversized_line_total_is_a_bad_request() {
    let _ = env_logger::try_init().ok();
    let mut db = MockPricingBackend::new();
    db.expect_fetch_item().returning(|id| Ok(Some(CatalogItem::new(id, "Yacht", Money::from(Decimal::MAX)))));
    db.expect_fetch_customer().times(0);
    let mut authorizer = MockAuthorizer::new();
    authorizer.expect_authorize().times(0);
    let items = json!([{ "itemID": "Y", "amount": 2 }]);
    let (status, body) = send_request(checkout_request(checkout_body(items, "")), configure(db, authorizer)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("too large"), "{body}");
}

#[actix_web::test]
async fn missing_address_field_is_reported_as_an_invalid_address() {
    let _ = env_logger::try_init().ok();
    let mut authorizer = MockAuthorizer::new();
    authorizer.expect_authorize().times(0);
    let mut body = checkout_body(json!([{ "itemID": "A", "amount": 1 }]), "");
    body.as_object_mut().unwrap().remove("city");
    let (status, body) = send_request(checkout_request(body), configure(catalog(), authorizer)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error: serde_json::Value = serde_json::from_str(&body).unwrap();
    let message = error["error"].as_str().unwrap();
    assert!(message.contains("Invalid shipping address provided. The city field"), "{message}");
}

#[actix_web::test]
async fn unknown_item_is_not_found() {
    let _ = env_logger::try_init().ok();
    let mut authorizer = MockAuthorizer::new();
    authorizer.expect_authorize().times(0);
    let items = json!([{ "itemID": "A", "amount": 1 }, { "itemID": "Z", "amount": 1 }]);
    let (status, body) = send_request(checkout_request(checkout_body(items, "")), configure(catalog(), authorizer)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("Item with ID Z does not exist"), "{body}");
}

#[actix_web::test]
async fn incomplete_address_is_a_bad_request() {
    let _ = env_logger::try_init().ok();
    let mut authorizer = MockAuthorizer::new();
    authorizer.expect_authorize().times(0);
    let mut body = checkout_body(json!([{ "itemID": "A", "amount": 1 }]), "");
    body["city"] = json!(" ");
    let (status, body) = send_request(checkout_request(body), configure(catalog(), authorizer)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("city"), "{body}");
}

#[actix_web::test]
async fn provider_failure_is_a_bad_gateway() {
    let _ = env_logger::try_init().ok();
    let mut authorizer = MockAuthorizer::new();
    authorizer
        .expect_authorize()
        .times(1)
        .returning(|_| Err(AuthorizationError::AuthorizationFailed("card network unavailable".into())));
    let items = json!([{ "itemID": "A", "amount": 1 }]);
    let (status, body) = send_request(checkout_request(checkout_body(items, "")), configure(catalog(), authorizer)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.contains("card network unavailable"), "{body}");
}

#[actix_web::test]
async fn malformed_body_is_rejected() {
    let _ = env_logger::try_init().ok();
    let mut authorizer = MockAuthorizer::new();
    authorizer.expect_authorize().times(0);
    let req = checkout_request(json!({ "name": "Jane", "item": "A" }));
    let (status, body) = send_request(req, configure(MockPricingBackend::new(), authorizer)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert!(error["error"].as_str().unwrap().starts_with("Invalid request."), "{body}");
}
