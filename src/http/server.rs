//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create the Axum Router and wire up middleware (request ID, tracing,
//!   panic catching)
//! - Classify each request and answer it or hand it to the forwarding engine
//! - Serve until shutdown, then drain within the grace period

use std::any::Any;
use std::future::IntoFuture;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Request, StatusCode},
    response::Response,
    routing::any,
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::Instrument;

use crate::config::ProxyConfig;
use crate::http::forward::ForwardingEngine;
use crate::http::request::{make_span, UuidRequestId, X_REQUEST_ID};
use crate::http::response::{error_response, preflight_response, redirect_response, ResponseWriter};
use crate::lifecycle::{startup, Lifecycle, ServerState, Shutdown, ShutdownOutcome};
use crate::net::{build_client, UpstreamClient};
use crate::routing::classifier::INVALID_GATEWAY;
use crate::routing::matcher::request_host;
use crate::routing::{classify, Policies, PolicyError, Route};
use crate::security::headers::GatewayHeaders;

/// Error building the server from configuration.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Invalid routing tables: {0}")]
    Policy(#[from] PolicyError),

    #[error("Failed to set up upstream TLS: {0}")]
    Tls(#[from] rustls::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub policies: Arc<Policies>,
    pub engine: ForwardingEngine,
}

/// HTTP server for the gateway proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    policies: Arc<Policies>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, ServerError> {
        let client = build_client()?;
        Self::with_client(config, client)
    }

    /// Create a server that reaches upstreams through `client`.
    pub fn with_client(config: ProxyConfig, client: UpstreamClient) -> Result<Self, ServerError> {
        let policies = Arc::new(Policies::from_config(&config)?);
        let engine = ForwardingEngine::new(client, config.timeouts.request());

        let state = AppState {
            policies: policies.clone(),
            engine,
        };

        let router = Self::build_router(state);
        Ok(Self {
            router,
            config,
            policies,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(dispatch))
            .route("/", any(dispatch))
            .with_state(state)
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http().make_span_with(make_span))
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId))
    }

    /// The router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires, then drain.
    ///
    /// In-flight requests get `timeouts.shutdown_grace_ms` to finish; after
    /// that the server gives up on them and reports a forced shutdown.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: Shutdown,
    ) -> Result<ShutdownOutcome, std::io::Error> {
        let mut lifecycle = Lifecycle::new();
        let grace = self.config.timeouts.shutdown_grace();

        let addr = listener.local_addr()?;
        startup::log_policies(&self.policies);
        lifecycle.advance(ServerState::Listening);
        tracing::info!(address = %addr, "HTTP server accepting connections");

        let drain_signal = {
            let shutdown = shutdown.clone();
            async move { shutdown.triggered().await }
        };
        let serve = axum::serve(listener, self.router)
            .with_graceful_shutdown(drain_signal)
            .into_future();
        tokio::pin!(serve);

        tokio::select! {
            result = &mut serve => {
                result?;
                lifecycle.advance(ServerState::Draining);
            }
            _ = shutdown.triggered() => {
                lifecycle.advance(ServerState::Draining);
                tracing::info!(grace_ms = grace.as_millis() as u64, "No longer accepting connections, draining in-flight requests");
                if let Err(_elapsed) = tokio::time::timeout(grace, &mut serve).await {
                    tracing::error!(grace_ms = grace.as_millis() as u64, "Grace period elapsed with requests in flight");
                    lifecycle.advance(ServerState::Stopped);
                    return Ok(ShutdownOutcome::Forced { grace });
                }
            }
        }

        lifecycle.advance(ServerState::Stopped);
        tracing::info!("HTTP server stopped");
        Ok(ShutdownOutcome::Graceful)
    }
}

/// Classify the request and answer it, or forward it to its gateway.
async fn dispatch(State(state): State<AppState>, request: Request<Body>) -> Response {
    let host = request_host(request.headers(), request.uri()).map(str::to_owned);
    let route = classify(&state.policies, request.method(), host.as_deref(), request.uri());

    match route {
        Route::CorsPreflight => preflight_response(),
        Route::Redirect { location } => {
            tracing::debug!(location = %location, "Redirecting");
            redirect_response(&location)
        }
        Route::Reject { status, reason } => {
            tracing::warn!(
                host = host.as_deref().unwrap_or("-"),
                path = %request.uri().path(),
                reason,
                "Request rejected"
            );
            error_response(status, reason)
        }
        Route::GatewayProxy { key, path, referrer } => {
            proxy(&state, request, &key, &path, &referrer).await
        }
    }
}

async fn proxy(
    state: &AppState,
    request: Request<Body>,
    key: &str,
    path: &str,
    referrer: &str,
) -> Response {
    let Some(gateway) = state.policies.gateways.get(key) else {
        tracing::warn!(gateway = key, "Request rejected: unknown gateway");
        return error_response(StatusCode::BAD_REQUEST, INVALID_GATEWAY);
    };
    let Ok(referer) = HeaderValue::from_str(referrer) else {
        tracing::error!(referrer, "Configured referrer is not a valid header value");
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Invalid referrer");
    };

    let extra = GatewayHeaders {
        host: gateway.host_header().clone(),
        referer,
    };
    let target = gateway.target_url(path);
    tracing::debug!(gateway = key, target = %target, "Forwarding to gateway");

    // The exchange runs in its own task: it keeps going while this handler
    // waits, and learns about a client disconnect when `pending` is dropped.
    let (writer, pending) = ResponseWriter::channel();
    let engine = state.engine.clone();
    tokio::spawn(
        async move {
            engine.forward(request, &target, &extra, writer).await;
        }
        .instrument(tracing::Span::current()),
    );

    pending.recv().await
}

/// Turn a handler panic into a plain-text 500.
pub(crate) fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = detail, "Request handler panicked");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}
