//! Webhook signature verification.
//!
//! Stripe signs every webhook delivery with the endpoint's signing secret and sends the result in the
//! `Stripe-Signature` header:
//!
//! ```text
//! Stripe-Signature: t=1492774577,v1=5257a869e7ecebeda32affa62cdca3fa51cad7e77a0e56ff536d0ce8e108d8bd
//! ```
//!
//! `t` is the unix time at which the payload was signed and each `v1` entry is a hex HMAC-SHA256 over `"{t}.{body}"`.
//! Several `v1` entries may be present while a secret is being rolled. Entries for other schemes are ignored.
//!
//! The HMAC is computed over the body exactly as it arrived on the wire. Callers must hand over the raw bytes; a
//! body that has been parsed and re-serialized will not verify.
use chrono::{DateTime, Duration, Utc};
use cko_common::Secret;
use hmac::{Hmac, Mac};
use log::*;
use sha2::Sha256;
use thiserror::Error;

use crate::StripeEvent;

type HmacSha256 = Hmac<Sha256>;

pub const STRIPE_SIGNATURE_HEADER: &str = "Stripe-Signature";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookError {
    #[error("No signature header was provided")]
    MissingHeader,
    #[error("The signature header is malformed. {0}")]
    MalformedHeader(String),
    #[error("The webhook signature is invalid")]
    InvalidSignature,
    #[error("The webhook timestamp {timestamp} is outside the allowed window (now: {now})")]
    StaleTimestamp { timestamp: i64, now: i64 },
    #[error("The webhook payload is not a valid event. {0}")]
    MalformedPayload(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SignatureHeader {
    timestamp: i64,
    signatures: Vec<Vec<u8>>,
}

fn parse_signature_header(header: &str) -> Result<SignatureHeader, WebhookError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => {
                let t = value
                    .parse::<i64>()
                    .map_err(|e| WebhookError::MalformedHeader(format!("Invalid timestamp '{value}'. {e}")))?;
                timestamp = Some(t);
            },
            // An entry that isn't valid hex can never match, so it is simply skipped
            "v1" => match hex::decode(value) {
                Ok(sig) => signatures.push(sig),
                Err(e) => debug!("🔐️ Ignoring undecodable v1 signature. {e}"),
            },
            _ => {},
        }
    }
    let timestamp = timestamp.ok_or_else(|| WebhookError::MalformedHeader("No timestamp found".into()))?;
    if signatures.is_empty() {
        return Err(WebhookError::MalformedHeader("No v1 signatures found".into()));
    }
    Ok(SignatureHeader { timestamp, signatures })
}

fn signed_payload_mac(payload: &[u8], secret: &str, timestamp: i64) -> HmacSha256 {
    // HMAC accepts keys of any length, so this cannot fail
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes()).unwrap_or_else(|_| unreachable!());
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    mac
}

/// Computes the hex-encoded `v1` signature for `payload` as Stripe would. Handy for tests and local tooling.
pub fn compute_signature(payload: &[u8], secret: &str, timestamp: i64) -> String {
    hex::encode(signed_payload_mac(payload, secret, timestamp).finalize().into_bytes())
}

/// Checks that `signature_header` carries a valid signature for `payload`, signed no more than `tolerance` away from
/// `now`. Signatures are compared in constant time.
pub fn verify_signature_at(
    payload: &[u8],
    signature_header: &str,
    secret: &Secret<String>,
    tolerance: Duration,
    now: DateTime<Utc>,
) -> Result<(), WebhookError> {
    let header = parse_signature_header(signature_header)?;
    let mac = signed_payload_mac(payload, secret.reveal(), header.timestamp);
    let valid = header.signatures.iter().any(|sig| mac.clone().verify_slice(sig).is_ok());
    if !valid {
        return Err(WebhookError::InvalidSignature);
    }
    let now = now.timestamp();
    let tolerance = tolerance.num_seconds().unsigned_abs();
    if now.abs_diff(header.timestamp) > tolerance {
        return Err(WebhookError::StaleTimestamp { timestamp: header.timestamp, now });
    }
    Ok(())
}

/// Authenticates a webhook delivery and parses it into a [`StripeEvent`], using the current time as the reference for
/// the replay window.
pub fn verify_event(
    payload: &[u8],
    signature_header: &str,
    secret: &Secret<String>,
    tolerance: Duration,
) -> Result<StripeEvent, WebhookError> {
    verify_event_at(payload, signature_header, secret, tolerance, Utc::now())
}

pub fn verify_event_at(
    payload: &[u8],
    signature_header: &str,
    secret: &Secret<String>,
    tolerance: Duration,
    now: DateTime<Utc>,
) -> Result<StripeEvent, WebhookError> {
    verify_signature_at(payload, signature_header, secret, tolerance, now)?;
    serde_json::from_slice::<StripeEvent>(payload).map_err(|e| WebhookError::MalformedPayload(e.to_string()))
}
