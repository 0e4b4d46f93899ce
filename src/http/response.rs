//! Response handling.
//!
//! # Responsibilities
//! - Finalize each inbound response exactly once
//! - Build the plain-text, redirect and preflight responses
//! - Tell the forwarding engine when the inbound side has gone away
//!
//! # Design Decisions
//! - The response travels through a oneshot channel: first write wins
//! - Writes after the first, or after the receiver was dropped, are no-ops
//! - A dropped receiver is how a client disconnect reaches the engine

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::Response,
};
use tokio::sync::oneshot;

use crate::http::cors;

/// Single-use handle for answering one inbound request.
#[derive(Debug)]
pub struct ResponseWriter {
    tx: Option<oneshot::Sender<Response>>,
}

/// The inbound side of a [`ResponseWriter`].
#[derive(Debug)]
pub struct PendingResponse {
    rx: oneshot::Receiver<Response>,
}

impl ResponseWriter {
    pub fn channel() -> (ResponseWriter, PendingResponse) {
        let (tx, rx) = oneshot::channel();
        (ResponseWriter { tx: Some(tx) }, PendingResponse { rx })
    }

    /// Deliver `response`. Returns false if a response was already written or
    /// nobody is listening any more.
    pub fn write(&mut self, response: Response) -> bool {
        match self.tx.take() {
            Some(tx) => tx.send(response).is_ok(),
            None => false,
        }
    }

    /// Deliver a plain-text error, unless something was already written.
    pub fn write_error(&mut self, status: StatusCode, message: &str) -> bool {
        if self.tx.is_none() {
            return false;
        }
        self.write(error_response(status, message))
    }

    /// Resolves when the inbound side stops waiting. Returns at once if the
    /// response was already written.
    pub async fn closed(&mut self) {
        if let Some(tx) = self.tx.as_mut() {
            tx.closed().await;
        }
    }
}

impl PendingResponse {
    /// Wait for the written response. A writer dropped without writing (for
    /// instance by a panicking task) yields a 500.
    pub async fn recv(self) -> Response {
        match self.rx.await {
            Ok(response) => response,
            Err(_) => {
                tracing::error!("Response writer dropped without a response");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

fn text_plain() -> HeaderValue {
    HeaderValue::from_static("text/plain")
}

/// Plain-text error response.
pub fn error_response(status: StatusCode, message: &str) -> Response {
    let mut response = Response::new(Body::from(message.to_string()));
    *response.status_mut() = status;
    response.headers_mut().insert(header::CONTENT_TYPE, text_plain());
    response
}

/// 302 to `location` with a short human-readable body.
pub fn redirect_response(location: &str) -> Response {
    let Ok(value) = HeaderValue::from_str(location) else {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Invalid redirect target");
    };

    let mut response = Response::new(Body::from(format!("Redirecting to {location}")));
    *response.status_mut() = StatusCode::FOUND;
    let headers = response.headers_mut();
    headers.insert(header::LOCATION, value);
    headers.insert(header::CONTENT_TYPE, text_plain());
    cors::apply_allow_origin(headers);
    response
}

/// 200 with the CORS header set and no body.
pub fn preflight_response() -> Response {
    let mut response = Response::new(Body::empty());
    cors::apply(response.headers_mut());
    response
}
