//! Compiled, immutable routing tables.
//!
//! # Responsibilities
//! - Turn the validated config into lookup-ready tables
//! - Keep gateway order stable (first match wins)
//! - Answer host and gateway lookups without locking
//!
//! # Design Decisions
//! - Built once at startup and shared via `Arc`
//! - Host keys stored normalized, so lookups need a single hash lookup
//! - Construction re-checks gateway keys so tables built in code stay disjoint

use std::collections::HashMap;

use axum::http::HeaderValue;
use thiserror::Error;
use url::Url;

use crate::config::validation::parse_http_url;
use crate::config::{GatewayConfig, ProxyConfig};
use crate::routing::matcher::normalize_host;

/// Error building routing tables.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("gateway {key:?}: target {target:?} is not an absolute http(s) URL")]
    InvalidTarget { key: String, target: String },

    #[error("gateway {key:?}: invalid host header {value:?}")]
    InvalidHostHeader { key: String, value: String },

    #[error("gateway keys {0:?} and {1:?} overlap")]
    OverlappingKeys(String, String),

    #[error("{table} entry for {host:?}: {url:?} is not a usable URL")]
    InvalidUrl {
        table: &'static str,
        host: String,
        url: String,
    },
}

/// One upstream payment gateway.
#[derive(Debug, Clone)]
pub struct GatewayRoute {
    key: String,
    target_origin: Url,
    host_header: HeaderValue,
}

impl GatewayRoute {
    pub fn new(config: &GatewayConfig) -> Result<Self, PolicyError> {
        let target_origin =
            parse_http_url(&config.target).ok_or_else(|| PolicyError::InvalidTarget {
                key: config.key.clone(),
                target: config.target.clone(),
            })?;
        let host_header = HeaderValue::from_str(&config.host_header).map_err(|_| {
            PolicyError::InvalidHostHeader {
                key: config.key.clone(),
                value: config.host_header.clone(),
            }
        })?;

        Ok(Self {
            key: config.key.clone(),
            target_origin,
            host_header,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn target_origin(&self) -> &Url {
        &self.target_origin
    }

    pub fn host_header(&self) -> &HeaderValue {
        &self.host_header
    }

    /// Absolute URL for `path_and_query` on this gateway.
    pub fn target_url(&self, path_and_query: &str) -> String {
        let origin = self.target_origin.as_str().trim_end_matches('/');
        format!("{origin}{path_and_query}")
    }
}

/// Gateways in configured order, with pairwise disjoint keys.
#[derive(Debug, Clone, Default)]
pub struct GatewayTable {
    routes: Vec<GatewayRoute>,
}

impl GatewayTable {
    pub fn new(routes: Vec<GatewayRoute>) -> Result<Self, PolicyError> {
        for (i, a) in routes.iter().enumerate() {
            for b in &routes[i + 1..] {
                if a.key.starts_with(&b.key) || b.key.starts_with(&a.key) {
                    return Err(PolicyError::OverlappingKeys(a.key.clone(), b.key.clone()));
                }
            }
        }
        Ok(Self { routes })
    }

    pub fn iter(&self) -> impl Iterator<Item = &GatewayRoute> {
        self.routes.iter()
    }

    pub fn get(&self, key: &str) -> Option<&GatewayRoute> {
        self.routes.iter().find(|r| r.key == key)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// A host-keyed table of URLs (referrers or redirect targets).
#[derive(Debug, Clone, Default)]
pub struct HostTable {
    entries: HashMap<String, String>,
}

impl HostTable {
    fn build<'a>(
        table: &'static str,
        entries: impl IntoIterator<Item = (&'a String, &'a String)>,
    ) -> Result<Self, PolicyError> {
        let mut out = HashMap::new();
        for (host, url) in entries {
            if parse_http_url(url).is_none() {
                return Err(PolicyError::InvalidUrl {
                    table,
                    host: host.clone(),
                    url: url.clone(),
                });
            }
            out.insert(normalize_host(host), url.clone());
        }
        Ok(Self { entries: out })
    }

    /// Look up an already-normalized host.
    pub fn get(&self, host: &str) -> Option<&str> {
        self.entries.get(host).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted by host, for logging.
    pub fn sorted(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .map(|(h, u)| (h.as_str(), u.as_str()))
            .collect();
        entries.sort_unstable();
        entries
    }
}

/// Everything the classifier and forwarding engine read per request.
#[derive(Debug, Clone, Default)]
pub struct Policies {
    pub gateways: GatewayTable,
    /// Host → referrer. A host missing here is rejected outright.
    pub hosts: HostTable,
    /// Host → redirect base URL.
    pub redirects: HostTable,
}

impl Policies {
    pub fn from_config(config: &ProxyConfig) -> Result<Self, PolicyError> {
        let routes = config
            .gateways
            .iter()
            .map(GatewayRoute::new)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            gateways: GatewayTable::new(routes)?,
            hosts: HostTable::build("referrers", &config.referrers)?,
            redirects: HostTable::build("redirects", &config.redirects)?,
        })
    }
}
