//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, host, path)
//!     → classifier.rs (ordered rules)
//!     → matcher.rs (host normalization, gateway prefixes)
//!     → policy.rs (immutable tables)
//!     → Return: Route (preflight, redirect, gateway proxy, reject)
//!
//! Table Compilation (at startup):
//!     ProxyConfig
//!     → Policies::from_config
//!     → Freeze behind Arc
//! ```
//!
//! # Design Decisions
//! - Tables compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always yields the same Route
//! - Gateway keys are disjoint, so order never changes the outcome

pub mod classifier;
pub mod matcher;
pub mod policy;

pub use classifier::{classify, Route};
pub use policy::{GatewayRoute, GatewayTable, HostTable, Policies, PolicyError};
