use std::{net::IpAddr, str::FromStr};

use actix_web::{web, HttpRequest};
use log::{debug, trace};
use regex::Regex;

use crate::{config::ServerOptions, errors::ServerError};

/// Bodies that cannot be deserialized are answered with the same `{"error": ..}` shape as every other client error.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        debug!("💻️ Rejecting request body. {err}");
        ServerError::InvalidRequest(err.to_string()).into()
    })
}

/// Get the remote IP address from the request. It uses 3 sources to determine the IP address, in decreasing order
/// of preference:
/// 1. The `X-Forwarded-For` header, iif `use_x_forwarded_for` is set to true in the configuration.
/// 2. The `Forwarded` header, iif `use_forwarded` is set to true in the configuration.
/// 3. The peer address from the connection info.
pub fn get_remote_ip(req: &HttpRequest, options: ServerOptions) -> Option<IpAddr> {
    let mut result = None;
    if options.use_x_forwarded_for {
        trace!("Checking X-Forwarded-For header");
        // The left-most entry is the originating client
        result = req
            .headers()
            .get("X-Forwarded-For")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| IpAddr::from_str(s.trim()).ok());
        if let Some(ip) = result {
            debug!("Using X-Forwarded-For header for remote address: {ip}");
        }
    }
    if options.use_forwarded && result.is_none() {
        trace!("Checking Forwarded header");
        result = req.headers().get("Forwarded").and_then(|v| v.to_str().ok()).and_then(ip_from_forwarded_header);
        if let Some(ip) = result {
            debug!("Using Forwarded header for remote address: {ip}");
        }
    }
    result.or_else(|| {
        let peer_addr = req.peer_addr();
        trace!("Using Peer address for remote address: {:?}", peer_addr);
        peer_addr.map(|a| a.ip())
    })
}

fn ip_from_forwarded_header(value: &str) -> Option<IpAddr> {
    let re = Regex::new(r#"for="?(?P<ip>[^;,"]+)"#).ok()?;
    let ip = re.captures(value)?.name("ip")?.as_str();
    IpAddr::from_str(ip).ok()
}

/// No whitelist means everyone is allowed. An empty whitelist allows no-one.
pub fn is_whitelisted(ip: Option<IpAddr>, whitelist: Option<&[IpAddr]>) -> bool {
    match (ip, whitelist) {
        (_, None) => true,
        (Some(ip), Some(whitelist)) => whitelist.contains(&ip),
        (None, Some(_)) => false,
    }
}
