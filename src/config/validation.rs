//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ports valid)
//! - Detect gateway keys that collide or shadow each other
//! - Check that every URL and header value is usable on the wire
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;

use axum::http::HeaderValue;
use thiserror::Error;
use url::Url;

use crate::config::schema::ProxyConfig;
use crate::routing::matcher::normalize_host;

/// A single semantic problem found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.port must not be 0")]
    ZeroPort,

    #[error("timeouts.{0} must be greater than 0")]
    ZeroTimeout(&'static str),

    #[error("gateway key {0:?} must be non-empty and must not contain '/', '?' or '#'")]
    InvalidGatewayKey(String),

    #[error("gateway key {0:?} is configured more than once")]
    DuplicateGatewayKey(String),

    #[error("gateway key {shorter:?} is a prefix of {longer:?}")]
    OverlappingGatewayKeys { shorter: String, longer: String },

    #[error("gateway {key:?} target {target:?} is not an absolute http(s) URL")]
    InvalidGatewayTarget { key: String, target: String },

    #[error("gateway {key:?} host_header {value:?} is not a valid header value")]
    InvalidHostHeader { key: String, value: String },

    #[error("{table}.{host:?} value {url:?} is not an absolute http(s) URL")]
    InvalidUrl {
        table: &'static str,
        host: String,
        url: String,
    },

    #[error("{table} host {host:?} is listed more than once")]
    DuplicateHost { table: &'static str, host: String },
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.port == 0 {
        errors.push(ValidationError::ZeroPort);
    }
    if config.timeouts.request_ms == 0 {
        errors.push(ValidationError::ZeroTimeout("request_ms"));
    }
    if config.timeouts.shutdown_grace_ms == 0 {
        errors.push(ValidationError::ZeroTimeout("shutdown_grace_ms"));
    }

    validate_gateways(config, &mut errors);
    validate_host_table("referrers", config.referrers.iter(), &mut errors);
    validate_host_table("redirects", config.redirects.iter(), &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_gateways(config: &ProxyConfig, errors: &mut Vec<ValidationError>) {
    let mut seen = HashSet::new();

    for gateway in &config.gateways {
        if !is_valid_key(&gateway.key) {
            errors.push(ValidationError::InvalidGatewayKey(gateway.key.clone()));
        } else if !seen.insert(gateway.key.as_str()) {
            errors.push(ValidationError::DuplicateGatewayKey(gateway.key.clone()));
        }

        if parse_http_url(&gateway.target).is_none() {
            errors.push(ValidationError::InvalidGatewayTarget {
                key: gateway.key.clone(),
                target: gateway.target.clone(),
            });
        }

        if HeaderValue::from_str(&gateway.host_header).is_err() || gateway.host_header.is_empty() {
            errors.push(ValidationError::InvalidHostHeader {
                key: gateway.key.clone(),
                value: gateway.host_header.clone(),
            });
        }
    }

    for (i, a) in config.gateways.iter().enumerate() {
        for b in config.gateways.iter().skip(i + 1) {
            if a.key == b.key || a.key.is_empty() || b.key.is_empty() {
                continue;
            }
            let (shorter, longer) = if a.key.len() <= b.key.len() { (a, b) } else { (b, a) };
            if longer.key.starts_with(&shorter.key) {
                errors.push(ValidationError::OverlappingGatewayKeys {
                    shorter: shorter.key.clone(),
                    longer: longer.key.clone(),
                });
            }
        }
    }
}

fn validate_host_table<'a>(
    table: &'static str,
    entries: impl Iterator<Item = (&'a String, &'a String)>,
    errors: &mut Vec<ValidationError>,
) {
    let mut seen = HashSet::new();

    for (host, url) in entries {
        if !seen.insert(normalize_host(host)) {
            errors.push(ValidationError::DuplicateHost {
                table,
                host: host.clone(),
            });
        }
        if parse_http_url(url).is_none() || HeaderValue::from_str(url).is_err() {
            errors.push(ValidationError::InvalidUrl {
                table,
                host: host.clone(),
                url: url.clone(),
            });
        }
    }
}

fn is_valid_key(key: &str) -> bool {
    !key.is_empty() && !key.contains(['/', '?', '#'])
}

/// Parse `raw` as an absolute `http`/`https` URL with a host.
pub(crate) fn parse_http_url(raw: &str) -> Option<Url> {
    let url = Url::parse(raw).ok()?;
    let scheme_ok = matches!(url.scheme(), "http" | "https");
    (scheme_ok && url.has_host()).then_some(url)
}
