//! OS signal handling.
//!
//! # Responsibilities
//! - Register signal handlers (SIGTERM, SIGINT)
//! - Translate signals into a shutdown trigger
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Handlers stay installed for the whole process, so repeated signals
//!   during draining are absorbed instead of killing the process

use crate::lifecycle::shutdown::Shutdown;

/// Wait for the next interrupt or terminate signal and return its name.
#[cfg(unix)]
pub async fn next_signal(
    interrupt: &mut tokio::signal::unix::Signal,
    terminate: &mut tokio::signal::unix::Signal,
) -> &'static str {
    tokio::select! {
        _ = interrupt.recv() => "SIGINT",
        _ = terminate.recv() => "SIGTERM",
    }
}

/// Spawn a task that triggers `shutdown` on SIGINT/SIGTERM.
#[cfg(unix)]
pub fn spawn_signal_listener(shutdown: Shutdown) -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;

    tokio::spawn(async move {
        loop {
            let name = next_signal(&mut interrupt, &mut terminate).await;
            if shutdown.trigger() {
                tracing::info!(signal = name, "Shutdown signal received, draining");
            } else {
                tracing::info!(signal = name, "Already draining, signal ignored");
            }
        }
    });
    Ok(())
}

/// Spawn a task that triggers `shutdown` on Ctrl+C.
#[cfg(not(unix))]
pub fn spawn_signal_listener(shutdown: Shutdown) -> std::io::Result<()> {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if shutdown.trigger() {
                tracing::info!(signal = "ctrl-c", "Shutdown signal received, draining");
            }
        }
    });
    Ok(())
}
