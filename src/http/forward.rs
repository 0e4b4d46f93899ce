//! Forwarding of gateway requests.
//!
//! # Responsibilities
//! - Build the outbound request (target URI, rewritten headers, body)
//! - Race the upstream exchange against the deadline and the client
//! - Relay the upstream response, or answer with an error status
//! - Hold the exchange open until the body is relayed or the deadline passes
//!
//! # Design Decisions
//! - Only POST/PUT/PATCH bodies are streamed upstream, never buffered
//! - Whoever finishes the race first decides; the writer accepts one response
//! - Dropping the outbound future is how the upstream connection is aborted

use std::time::Duration;

use axum::{
    body::Body,
    http::{Method, Request, Response, StatusCode, Uri},
};
use thiserror::Error;
use tracing::Span;

use crate::http::cors;
use crate::http::response::ResponseWriter;
use crate::http::stream::RelayBody;
use crate::net::UpstreamClient;
use crate::resilience::RequestDeadline;
use crate::security::headers::{proxy_headers, strip_hop_by_hop, GatewayHeaders};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Ways an upstream exchange can fail.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("Failed to connect to upstream: {0}")]
    Connect(#[source] BoxError),

    #[error("Upstream did not complete within {0:?}")]
    Timeout(Duration),

    #[error("Upstream protocol error: {0}")]
    UpstreamProtocol(#[source] BoxError),

    #[error("Client disconnected before the upstream exchange completed")]
    ClientDisconnected,

    #[error("Invalid upstream target {0:?}")]
    InvalidTarget(String),
}

impl ForwardError {
    fn from_client(err: hyper_util::client::legacy::Error) -> Self {
        if err.is_connect() {
            ForwardError::Connect(Box::new(err))
        } else {
            ForwardError::UpstreamProtocol(Box::new(err))
        }
    }

    /// Status to answer with, if the client is still there to hear it.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ForwardError::Timeout(_) => Some(StatusCode::GATEWAY_TIMEOUT),
            ForwardError::ClientDisconnected => None,
            ForwardError::Connect(_)
            | ForwardError::UpstreamProtocol(_)
            | ForwardError::InvalidTarget(_) => Some(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }

    fn client_message(&self) -> &'static str {
        match self {
            ForwardError::Timeout(_) => "Gateway timeout",
            ForwardError::Connect(_) => "Failed to reach payment gateway",
            ForwardError::UpstreamProtocol(_) => "Payment gateway error",
            ForwardError::InvalidTarget(_) => "Invalid gateway target",
            ForwardError::ClientDisconnected => "",
        }
    }
}

/// Result of a completed exchange: head and body were relayed.
#[derive(Debug, Clone, Copy)]
pub struct ForwardOutcome {
    pub status: StatusCode,
    pub elapsed: Duration,
    pub relayed_bytes: u64,
}

/// Whether the inbound body travels upstream for `method`.
pub fn forwards_body(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

/// Sends gateway requests upstream and streams the answers back.
#[derive(Clone)]
pub struct ForwardingEngine {
    client: UpstreamClient,
    timeout: Duration,
}

impl ForwardingEngine {
    pub fn new(client: UpstreamClient, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Forward `request` to `target` and answer through `writer`.
    ///
    /// Runs until the response body has been relayed. Failures are logged
    /// here and, while nothing has been written yet, turned into a 500 or 504
    /// for the client. The outcome is recorded on the request span.
    pub async fn forward(
        &self,
        request: Request<Body>,
        target: &str,
        extra: &GatewayHeaders,
        mut writer: ResponseWriter,
    ) {
        let method = request.method().clone();

        match self.exchange(request, target, extra, &mut writer).await {
            Ok(outcome) => {
                let span = Span::current();
                span.record("upstream_status", outcome.status.as_u16());
                span.record("upstream_ms", outcome.elapsed.as_millis() as u64);
                tracing::debug!(
                    method = %method,
                    target = %target,
                    status = outcome.status.as_u16(),
                    relayed_bytes = outcome.relayed_bytes,
                    elapsed_ms = outcome.elapsed.as_millis() as u64,
                    "Upstream exchange complete"
                );
            }
            Err(ForwardError::ClientDisconnected) => {
                tracing::info!(method = %method, target = %target, "Client disconnected, upstream request aborted");
            }
            Err(e) => {
                tracing::error!(method = %method, target = %target, error = %e, "Gateway request failed");
                if let Some(status) = e.status() {
                    writer.write_error(status, e.client_message());
                }
            }
        }
    }

    async fn exchange(
        &self,
        request: Request<Body>,
        target: &str,
        extra: &GatewayHeaders,
        writer: &mut ResponseWriter,
    ) -> Result<ForwardOutcome, ForwardError> {
        let uri: Uri = target
            .parse()
            .map_err(|_| ForwardError::InvalidTarget(target.to_string()))?;

        let (parts, body) = request.into_parts();
        let method = parts.method;
        let with_body = forwards_body(&method);

        let mut outbound = Request::new(if with_body { body } else { Body::empty() });
        *outbound.method_mut() = method;
        *outbound.uri_mut() = uri;
        *outbound.headers_mut() = proxy_headers(&parts.headers, extra, with_body);

        let deadline = RequestDeadline::start(self.timeout);
        let response = tokio::select! {
            _ = writer.closed() => return Err(ForwardError::ClientDisconnected),
            _ = deadline.sleep() => return Err(ForwardError::Timeout(self.timeout)),
            result = self.client.request(outbound) => result.map_err(ForwardError::from_client)?,
        };

        let (mut head, incoming) = response.into_parts();
        strip_hop_by_hop(&mut head.headers);
        cors::apply(&mut head.headers);
        let status = head.status;

        let (body, watch) = RelayBody::new(incoming, &deadline, self.timeout);
        if !writer.write(Response::from_parts(head, Body::new(body))) {
            return Err(ForwardError::ClientDisconnected);
        }

        // hyper only polls the relay while the client reads, so the deadline
        // is also enforced from here.
        let relayed_bytes = watch.enforce(&deadline, self.timeout).await?;

        Ok(ForwardOutcome {
            status,
            elapsed: deadline.elapsed(),
            relayed_bytes,
        })
    }
}
