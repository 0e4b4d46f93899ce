//! Upstream HTTP(S) client.
//!
//! # Responsibilities
//! - Build the client used to reach payment gateways
//! - Speak plain HTTP or TLS depending on the target scheme
//!
//! # Design Decisions
//! - HTTP/1.1 only, matching the inbound side
//! - No idle pool: every exchange opens and closes its own connection
//! - rustls with the ring provider and the bundled webpki roots

use std::sync::Arc;

use axum::body::Body;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

/// Client type shared by the forwarding engine.
pub type UpstreamClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Build the upstream client.
pub fn build_client() -> Result<UpstreamClient, rustls::Error> {
    let mut http = HttpConnector::new();
    http.enforce_http(false);
    http.set_nodelay(true);

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let https = HttpsConnectorBuilder::new()
        .with_provider_and_webpki_roots(provider)?
        .https_or_http()
        .enable_http1()
        .wrap_connector(http);

    let client = Client::builder(TokioExecutor::new())
        .pool_max_idle_per_host(0)
        .build(https);

    tracing::debug!("Upstream client ready (HTTP/1.1, no idle pool)");
    Ok(client)
}
