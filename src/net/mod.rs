//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound:  listener.rs (bind) → axum::serve accept loop
//! Outbound: client.rs (HTTP or TLS connector) → payment gateway
//! ```
//!
//! # Design Decisions
//! - The listening socket is owned by the server lifecycle only
//! - TLS is used on the upstream side only

pub mod client;
pub mod listener;

pub use client::{build_client, UpstreamClient};
pub use listener::{bind, ListenerError};
