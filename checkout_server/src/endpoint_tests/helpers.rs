use actix_web::{http::StatusCode, test, test::TestRequest, web::ServiceConfig, App};
use chrono::Utc;
use log::debug;
use stripe_tools::{webhook::compute_signature, STRIPE_SIGNATURE_HEADER};

// Only ever used to sign test payloads
pub const WEBHOOK_SECRET: &str = "whsec_test_4f1c2a9d8e7b";

/// Sends the request through an app built by `configure`. Errors raised by middleware are turned into the response
/// the client would see.
pub async fn send_request<F>(req: TestRequest, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => {
            let status = res.status();
            let body = test::read_body(res).await;
            (status, String::from_utf8_lossy(&body).into_owned())
        },
        Err(e) => (e.as_response_error().status_code(), e.to_string()),
    }
}

pub fn signature_header(payload: &str, timestamp: i64) -> String {
    let sig = compute_signature(payload.as_bytes(), WEBHOOK_SECRET, timestamp);
    format!("t={timestamp},v1={sig}")
}

pub fn signed_webhook_request(payload: &str) -> TestRequest {
    let header = signature_header(payload, Utc::now().timestamp());
    TestRequest::post()
        .uri("/stripe/webhook")
        .insert_header((STRIPE_SIGNATURE_HEADER, header))
        .insert_header(("Content-Type", "application/json"))
        .set_payload(payload.to_string())
}
