//! Server lifecycle states.

use std::fmt;

/// `Starting → Listening → Draining → Stopped`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ServerState {
    Starting,
    Listening,
    Draining,
    Stopped,
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServerState::Starting => "starting",
            ServerState::Listening => "listening",
            ServerState::Draining => "draining",
            ServerState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Tracks the current state; only forward transitions are accepted.
#[derive(Debug)]
pub struct Lifecycle {
    state: ServerState,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            state: ServerState::Starting,
        }
    }

    pub fn state(&self) -> ServerState {
        self.state
    }

    /// Move to `next`. Returns false (and stays put) for repeated or
    /// backward transitions.
    pub fn advance(&mut self, next: ServerState) -> bool {
        if next <= self.state {
            return false;
        }
        tracing::info!(from = %self.state, to = %next, "Server state changed");
        self.state = next;
        true
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_moves_forward() {
        let mut lifecycle = Lifecycle::new();
        assert!(lifecycle.advance(ServerState::Listening));
        assert!(lifecycle.advance(ServerState::Draining));
        assert!(!lifecycle.advance(ServerState::Draining));
        assert!(!lifecycle.advance(ServerState::Listening));
        assert!(lifecycle.advance(ServerState::Stopped));
        assert_eq!(lifecycle.state(), ServerState::Stopped);
    }

    #[test]
    fn draining_can_be_skipped() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.advance(ServerState::Listening);
        assert!(lifecycle.advance(ServerState::Stopped));
    }
}
