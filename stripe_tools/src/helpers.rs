use serde_json::Value;

/// Stripe reports failures as `{"error": {"type": "...", "code": "...", "message": "..."}}`. Pull out the most useful
/// human-readable part, falling back to the raw body.
pub fn stripe_error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return body.to_string();
    };
    let error = &value["error"];
    match (error["type"].as_str(), error["message"].as_str()) {
        (Some(t), Some(m)) => format!("{t}: {m}"),
        (None, Some(m)) => m.to_string(),
        (Some(t), None) => t.to_string(),
        (None, None) => body.to_string(),
    }
}
