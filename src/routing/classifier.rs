//! Request classification.
//!
//! # Responsibilities
//! - Decide, from method, host and path alone, what happens to a request
//! - Return an explicit outcome, never a silent default
//!
//! # Rule order
//! 1. `OPTIONS` → CORS preflight
//! 2. Unknown or missing host → 400
//! 3. `/<gateway>/...` → gateway proxy
//! 4. Host with a redirect target → 302
//! 5. Anything else → 400

use axum::http::{Method, StatusCode, Uri};

use crate::routing::matcher::{normalize_host, strip_gateway_prefix};
use crate::routing::policy::Policies;

/// What to do with an inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    CorsPreflight,
    Redirect {
        location: String,
    },
    GatewayProxy {
        key: String,
        /// Path and query to request from the gateway.
        path: String,
        referrer: String,
    },
    Reject {
        status: StatusCode,
        reason: &'static str,
    },
}

impl Route {
    fn reject(reason: &'static str) -> Self {
        Route::Reject {
            status: StatusCode::BAD_REQUEST,
            reason,
        }
    }
}

pub const UNRECOGNIZED_HOST: &str = "unrecognized host";
pub const NO_REDIRECT_TARGET: &str = "no redirect target configured";
pub const INVALID_GATEWAY: &str = "invalid gateway";

/// Classify a request.
pub fn classify(policies: &Policies, method: &Method, host: Option<&str>, uri: &Uri) -> Route {
    if method == Method::OPTIONS {
        return Route::CorsPreflight;
    }

    let Some(host) = host.map(normalize_host) else {
        return Route::reject(UNRECOGNIZED_HOST);
    };
    let Some(referrer) = policies.hosts.get(&host) else {
        return Route::reject(UNRECOGNIZED_HOST);
    };

    let path = uri.path();
    for gateway in policies.gateways.iter() {
        if let Some(rest) = strip_gateway_prefix(path, gateway.key()) {
            let path = match uri.query() {
                Some(query) => format!("{rest}?{query}"),
                None => rest.to_string(),
            };
            return Route::GatewayProxy {
                key: gateway.key().to_string(),
                path,
                referrer: referrer.to_string(),
            };
        }
    }

    match policies.redirects.get(&host) {
        Some(base) => Route::Redirect {
            location: redirect_location(base, uri),
        },
        None => Route::reject(NO_REDIRECT_TARGET),
    }
}

fn redirect_location(base: &str, uri: &Uri) -> String {
    let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    format!("{}{}", base.trim_end_matches('/'), path_and_query)
}
