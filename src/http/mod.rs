//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, dispatch)
//!     → request.rs (request ID, tracing span)
//!     → [routing classifies the request]
//!     → response.rs (preflight / redirect / error, single-write guard)
//!     → forward.rs (gateway exchange) → stream.rs (body relay)
//!     → Send to client
//! ```

pub mod cors;
pub mod forward;
pub mod request;
pub mod response;
pub mod server;
pub mod stream;

pub use forward::{ForwardError, ForwardingEngine};
pub use request::{UuidRequestId, X_REQUEST_ID};
pub use response::{PendingResponse, ResponseWriter};
pub use server::{HttpServer, ServerError};
