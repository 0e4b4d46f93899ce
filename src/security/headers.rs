//! Header manipulation for proxied traffic.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers in both directions
//! - Build the header set sent to a gateway
//!
//! # Design Decisions
//! - Hop-by-hop headers describe a single connection and are never relayed
//! - `HeaderName` is stored lowercase, so matching is case-insensitive
//! - Repeated header values keep their order

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};

/// Headers scoped to one connection.
pub const HOP_BY_HOP: [HeaderName; 7] = [
    header::CONNECTION,
    header::UPGRADE,
    header::PROXY_AUTHORIZATION,
    header::PROXY_AUTHENTICATE,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
];

/// Returns true if `name` must not cross the proxy.
pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(name)
}

/// Copy `headers` without the hop-by-hop entries.
pub fn sanitize(headers: &HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if !is_hop_by_hop(name) {
            out.append(name.clone(), value.clone());
        }
    }
    out
}

/// In-place variant of [`sanitize`], used on upstream responses.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in &HOP_BY_HOP {
        headers.remove(name);
    }
}

/// Headers that replace the inbound values on a gateway request.
#[derive(Debug, Clone)]
pub struct GatewayHeaders {
    pub host: HeaderValue,
    pub referer: HeaderValue,
}

/// Build the outbound header set for a gateway request.
///
/// `Host` and `Referer` from `extra` win over anything the client sent, and
/// the upstream connection is always closed after the exchange.
pub fn proxy_headers(inbound: &HeaderMap, extra: &GatewayHeaders, with_body: bool) -> HeaderMap {
    let mut headers = sanitize(inbound);
    headers.insert(header::HOST, extra.host.clone());
    headers.insert(header::REFERER, extra.referer.clone());
    headers.insert(header::CONNECTION, HeaderValue::from_static("close"));
    if !with_body {
        headers.remove(header::CONTENT_LENGTH);
    }
    headers
}
