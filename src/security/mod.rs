//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Gateway request:
//!     → headers.rs (drop hop-by-hop, override Host/Referer, force close)
//!     → ForwardingEngine
//! Gateway response:
//!     → headers.rs (drop hop-by-hop)
//!     → CORS headers
//! ```
//!
//! # Design Decisions
//! - Connection-scoped headers never cross the proxy in either direction
//! - Gateway-facing identity (Host, Referer) comes from config, not the client

pub mod headers;
