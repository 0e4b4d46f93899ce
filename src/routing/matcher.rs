//! Host and path matching primitives.
//!
//! # Design Decisions
//! - Host matching is case-insensitive and ignores the port
//! - Path matching is case-sensitive and segment-aligned
//! - No regex, plain prefix checks only

use axum::http::{header, HeaderMap, Uri};

/// Normalize a host for table lookups: lowercase, without a trailing `:port`.
pub fn normalize_host(host: &str) -> String {
    let host = host.trim();
    let without_port = match host.rsplit_once(':') {
        // Bracketed IPv6 literals keep their colons.
        Some((name, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => {
            if name.starts_with('[') || !name.contains(':') {
                name
            } else {
                host
            }
        }
        _ => host,
    };
    without_port.to_ascii_lowercase()
}

/// Extract the host the client asked for: `Host` header, else the URI authority.
pub fn request_host<'a>(headers: &'a HeaderMap, uri: &'a Uri) -> Option<&'a str> {
    headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .filter(|h| !h.trim().is_empty())
        .or_else(|| uri.authority().map(|a| a.as_str()))
}

/// If `path` is `/<key>` or starts with `/<key>/`, return the remainder.
///
/// The remainder keeps its leading slash and is `/` when empty.
pub fn strip_gateway_prefix<'a>(path: &'a str, key: &str) -> Option<&'a str> {
    let rest = path.strip_prefix('/')?.strip_prefix(key)?;
    if rest.is_empty() {
        Some("/")
    } else if rest.starts_with('/') {
        Some(rest)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn normalizes_case_and_port() {
        assert_eq!(normalize_host("Pay.V1-Domain.com"), "pay.v1-domain.com");
        assert_eq!(normalize_host("pay.v1-domain.com:3000"), "pay.v1-domain.com");
        assert_eq!(normalize_host("[::1]:8080"), "[::1]");
        assert_eq!(normalize_host("example.com:"), "example.com:");
    }

    #[test]
    fn host_header_wins_over_authority() {
        let uri: Uri = "http://authority.example.com/path".parse().unwrap();
        let mut headers = HeaderMap::new();
        assert_eq!(request_host(&headers, &uri), Some("authority.example.com"));

        headers.insert(header::HOST, HeaderValue::from_static("pay.v1-domain.com"));
        assert_eq!(request_host(&headers, &uri), Some("pay.v1-domain.com"));

        let origin_form: Uri = "/path".parse().unwrap();
        assert_eq!(request_host(&HeaderMap::new(), &origin_form), None);
    }

    #[test]
    fn gateway_prefix_is_segment_aligned() {
        assert_eq!(strip_gateway_prefix("/vandar/v1/ipgs", "vandar"), Some("/v1/ipgs"));
        assert_eq!(strip_gateway_prefix("/vandar/", "vandar"), Some("/"));
        assert_eq!(strip_gateway_prefix("/vandar", "vandar"), Some("/"));
        assert_eq!(strip_gateway_prefix("/vandarx/v1", "vandar"), None);
        assert_eq!(strip_gateway_prefix("/other/vandar/", "vandar"), None);
        assert_eq!(strip_gateway_prefix("/Vandar/v1", "vandar"), None);
    }
}
