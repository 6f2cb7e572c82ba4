use chrono::Duration;
use cko_common::Secret;
use log::*;

pub const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com";
pub const DEFAULT_CLOCK_SKEW_TOLERANCE: Duration = Duration::minutes(5);

/// Everything needed to talk to Stripe. Built once at start-up and handed to [`crate::StripeApi`] and the webhook
/// verifier; nothing in this crate reads the process environment after construction.
#[derive(Debug, Clone)]
pub struct StripeConfig {
    /// Secret API key (`sk_live_...` / `sk_test_...`), sent as a bearer token.
    pub api_key: Secret<String>,
    /// The signing secret of the webhook endpoint (`whsec_...`).
    pub webhook_secret: Secret<String>,
    /// Webhook deliveries whose signed timestamp differs from the local clock by more than this are rejected.
    pub clock_skew_tolerance: Duration,
    /// Base URL of the API. Overridable so that a local mock can stand in for Stripe.
    pub api_base: String,
    /// Optional `Stripe-Version` header value. The account default is used if not set.
    pub api_version: Option<String>,
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self {
            api_key: Secret::default(),
            webhook_secret: Secret::default(),
            clock_skew_tolerance: DEFAULT_CLOCK_SKEW_TOLERANCE,
            api_base: DEFAULT_STRIPE_API_BASE.to_string(),
            api_version: None,
        }
    }
}

impl StripeConfig {
    pub fn new(api_key: &str, webhook_secret: &str) -> Self {
        Self {
            api_key: Secret::new(api_key.to_string()),
            webhook_secret: Secret::new(webhook_secret.to_string()),
            ..Default::default()
        }
    }

    pub fn with_clock_skew_tolerance(mut self, tolerance: Duration) -> Self {
        self.clock_skew_tolerance = tolerance;
        self
    }

    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    pub fn new_from_env_or_default() -> Self {
        let api_key = Secret::new(std::env::var("CKO_STRIPE_API_KEY").unwrap_or_else(|_| {
            error!("🪛️ CKO_STRIPE_API_KEY is not set. Payment intents cannot be created without it.");
            String::default()
        }));
        let webhook_secret = Secret::new(std::env::var("CKO_STRIPE_WEBHOOK_SECRET").unwrap_or_else(|_| {
            error!("🪛️ CKO_STRIPE_WEBHOOK_SECRET is not set. Every webhook delivery will fail signature checks.");
            String::default()
        }));
        let clock_skew_tolerance = std::env::var("CKO_STRIPE_CLOCK_SKEW_TOLERANCE")
            .map_err(|_| {
                info!(
                    "🪛️ CKO_STRIPE_CLOCK_SKEW_TOLERANCE is not set. Using the default of {}s.",
                    DEFAULT_CLOCK_SKEW_TOLERANCE.num_seconds()
                )
            })
            .and_then(|s| {
                s.parse::<i64>()
                    .ok()
                    .filter(|secs| *secs > 0)
                    .map(Duration::seconds)
                    .ok_or_else(|| warn!("🪛️ Invalid value for CKO_STRIPE_CLOCK_SKEW_TOLERANCE: {s}. Using default."))
            })
            .unwrap_or(DEFAULT_CLOCK_SKEW_TOLERANCE);
        let api_base = std::env::var("CKO_STRIPE_API_BASE")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| DEFAULT_STRIPE_API_BASE.to_string());
        let api_version = std::env::var("CKO_STRIPE_API_VERSION").ok();
        Self { api_key, webhook_secret, clock_skew_tolerance, api_base, api_version }
    }
}
