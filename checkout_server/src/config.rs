//! Server configuration
//!
//! Everything is read from environment variables once, at start-up. Missing values fall back to defaults, with a log
//! message saying so. Secrets are wrapped in [`cko_common::Secret`] so that printing the configuration never leaks
//! them.
use std::{env, net::IpAddr, str::FromStr};

use checkout_engine::cko_api::pricing_api::DEFAULT_MEMBER_DISCOUNT_PERCENT;
use cko_common::{helpers::env_flag, DEFAULT_CURRENCY_CODE};
use log::*;
use rust_decimal::Decimal;
use stripe_tools::StripeConfig;

const DEFAULT_CKO_HOST: &str = "127.0.0.1";
const DEFAULT_CKO_PORT: u16 = 8460;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/checkout_store.db";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_forwarded: bool,
    /// If supplied, requests against /stripe endpoints will be checked against a whitelist of Stripe IP addresses.
    /// To explicitly disable the whitelist, set this to "false", "none", or "0".
    pub stripe_whitelist: Option<Vec<IpAddr>>,
    /// The currency every payment intent is opened in.
    pub currency: String,
    /// Percentage taken off the subtotal for known customers.
    pub member_discount: Decimal,
    pub stripe: StripeConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_CKO_HOST.to_string(),
            port: DEFAULT_CKO_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            use_x_forwarded_for: false,
            use_forwarded: false,
            stripe_whitelist: None,
            currency: DEFAULT_CURRENCY_CODE.to_string(),
            member_discount: DEFAULT_MEMBER_DISCOUNT_PERCENT,
            stripe: StripeConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("CKO_HOST").ok().unwrap_or_else(|| DEFAULT_CKO_HOST.into());
        let port = env::var("CKO_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for CKO_PORT. {e} Using the default, {DEFAULT_CKO_PORT}, instead."
                    );
                    DEFAULT_CKO_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_CKO_PORT);
        let database_url = env::var("CKO_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ CKO_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let use_x_forwarded_for = env_flag("CKO_USE_X_FORWARDED_FOR", false);
        let use_forwarded = env_flag("CKO_USE_FORWARDED", false);
        let stripe_whitelist = env::var("CKO_STRIPE_IP_WHITELIST").ok().and_then(|s| parse_whitelist(&s));
        log_whitelist(&stripe_whitelist);
        let currency = env::var("CKO_CURRENCY")
            .map(|s| s.trim().to_lowercase())
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_CURRENCY_CODE.to_string());
        let member_discount = configure_member_discount();
        let stripe = StripeConfig::new_from_env_or_default();
        Self {
            host,
            port,
            database_url,
            use_x_forwarded_for,
            use_forwarded,
            stripe_whitelist,
            currency,
            member_discount,
            stripe,
        }
    }
}

fn configure_member_discount() -> Decimal {
    env::var("CKO_MEMBER_DISCOUNT")
        .map_err(|_| {
            info!(
                "🪛️ CKO_MEMBER_DISCOUNT is not set. Using the default value of {DEFAULT_MEMBER_DISCOUNT_PERCENT}%."
            )
        })
        .and_then(|s| {
            Decimal::from_str(s.trim())
                .ok()
                .filter(|d| !d.is_sign_negative() && *d <= Decimal::ONE_HUNDRED)
                .ok_or_else(|| warn!("🪛️ Invalid configuration value for CKO_MEMBER_DISCOUNT: {s}. Using the default."))
        })
        .unwrap_or(DEFAULT_MEMBER_DISCOUNT_PERCENT)
}

/// Parses a comma-separated list of IP addresses. Invalid entries are skipped. "none", "false" and "0" disable the
/// whitelist.
pub fn parse_whitelist(s: &str) -> Option<Vec<IpAddr>> {
    if ["none", "false", "0"].contains(&s.trim().to_lowercase().as_str()) {
        info!(
            "🪛️ Stripe IP whitelist is disabled. If this is not what you want, set CKO_STRIPE_IP_WHITELIST to a \
             comma-separated list of IP addresses to enable it."
        );
        return None;
    }
    let ip_addrs = s
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| {
            s.parse()
                .map_err(|e| {
                    warn!("🪛️ Ignoring invalid IP address ({s}) in CKO_STRIPE_IP_WHITELIST: {e}");
                })
                .ok()
        })
        .collect::<Vec<IpAddr>>();
    Some(ip_addrs)
}

fn log_whitelist(whitelist: &Option<Vec<IpAddr>>) {
    match whitelist {
        Some(whitelist) if whitelist.is_empty() => {
            warn!(
                "🚨️ The Stripe IP whitelist was configured, but is empty. The server will run, but won't accept any \
                 incoming Stripe requests."
            );
        },
        None => {
            info!("🪛️ No Stripe IP whitelist is set. Only signature validation will be used.");
        },
        Some(v) => {
            let addrs = v.iter().map(|a| a.to_string()).collect::<Vec<_>>().join(", ");
            info!("🪛️ Stripe IP whitelist: {addrs}");
        },
    }
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that is used to configure the server's behaviour. Generally we try to keep this
/// as small as possible, and exclude secrets to avoid passing sensitive information around the system.
#[derive(Clone, Copy, Debug, Default)]
pub struct ServerOptions {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { use_x_forwarded_for: config.use_x_forwarded_for, use_forwarded: config.use_forwarded }
    }
}
