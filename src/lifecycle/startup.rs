//! Startup reporting.
//!
//! Logs the routing tables the server is about to serve with, so operators
//! can see from the first lines of output what each host will get.

use crate::routing::Policies;

pub fn log_policies(policies: &Policies) {
    if policies.gateways.is_empty() {
        tracing::warn!("No gateways configured; every gateway path will fall through");
    }
    for gateway in policies.gateways.iter() {
        tracing::info!(
            key = gateway.key(),
            target = %gateway.target_origin(),
            host_header = ?gateway.host_header(),
            "Gateway route"
        );
    }

    if policies.hosts.is_empty() {
        tracing::warn!("No hosts configured; every request except OPTIONS will be rejected");
    }
    for (host, referrer) in policies.hosts.sorted() {
        tracing::info!(host, referrer, "Host policy");
    }
    for (host, target) in policies.redirects.sorted() {
        tracing::info!(host, target, "Redirect policy");
    }
}
