//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to gateway:
//!     → timeouts.rs (one deadline for connect + head + body)
//!     → On expiry: 504 if nothing was written, otherwise abort the stream
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every upstream exchange has a deadline
//! - No retries: gateway calls carry payment bodies and are not replayed

pub mod timeouts;

pub use timeouts::RequestDeadline;
