//! Timeout enforcement.
//!
//! # Responsibilities
//! - Give each upstream exchange a single deadline
//! - Let the head phase and the body phase share that deadline
//!
//! # Design Decisions
//! - Uses Tokio's timer facilities
//! - Deadline starts when the outbound connection is initiated
//! - Timed-out requests return 504 Gateway Timeout when nothing was sent yet

use std::time::Duration;

use tokio::time::{sleep_until, Instant, Sleep};

/// Fixed point in time by which an upstream exchange must finish.
#[derive(Debug, Clone, Copy)]
pub struct RequestDeadline {
    started: Instant,
    at: Instant,
}

impl RequestDeadline {
    /// Start the clock now.
    pub fn start(timeout: Duration) -> Self {
        let started = Instant::now();
        Self {
            started,
            at: started + timeout,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// A timer that fires at the deadline.
    pub fn sleep(&self) -> Sleep {
        sleep_until(self.at)
    }
}
