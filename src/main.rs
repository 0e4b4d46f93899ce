//! Gateway Proxy
//!
//! A host-aware reverse proxy in front of payment gateways, built with Tokio
//! and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────┐
//!                      │                  GATEWAY PROXY                   │
//!                      │                                                  │
//!   Client Request     │  ┌─────────┐   ┌──────────┐   ┌──────────────┐   │
//!   ───────────────────┼─▶│   net   │──▶│   http   │──▶│   routing    │   │
//!                      │  │listener │   │  server  │   │  classifier  │   │
//!                      │  └─────────┘   └──────────┘   └──────┬───────┘   │
//!                      │                                      │           │
//!                      │          preflight / redirect / 400  │  gateway  │
//!                      │                 ◀────────────────────┤           │
//!                      │                                      ▼           │
//!   Client Response    │  ┌──────────┐   ┌──────────┐   ┌──────────────┐  │
//!   ◀──────────────────┼──│ response │◀──│  stream  │◀──│   forward    │◀─┼── Payment
//!                      │  │  writer  │   │  relay   │   │  (+ timeout) │  │   Gateway
//!                      │  └──────────┘   └──────────┘   └──────────────┘  │
//!                      │                                                  │
//!                      │  config · lifecycle · observability · security   │
//!                      └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use gateway_proxy::config::{self, ProxyConfig};
use gateway_proxy::lifecycle::{signals, Shutdown};
use gateway_proxy::observability::logging;
use gateway_proxy::{net, HttpServer, ShutdownOutcome};

#[derive(Parser)]
#[command(name = "gateway-proxy")]
#[command(about = "Host-aware reverse proxy for payment gateways", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long, env = "GATEWAY_PROXY_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on, overriding the config file.
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Log level, overriding the config file.
    #[arg(long, env = "LOG_LEVEL")]
    log_level: Option<String>,
}

impl Cli {
    fn load(&self) -> Result<ProxyConfig, config::ConfigError> {
        let mut config = match &self.config {
            Some(path) => config::load_config(path)?,
            None => ProxyConfig::default(),
        };

        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(level) = &self.log_level {
            config.observability.log_level = level.clone();
        }

        config::validate_config(&config).map_err(config::ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match cli.load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("gateway-proxy: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init(&config.observability) {
        eprintln!("gateway-proxy: failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    tracing::info!("gateway-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    if cli.config.is_none() {
        tracing::warn!("No configuration file given, running with empty routing tables");
    }

    tracing::info!(
        bind_address = %config.listener.bind_address(),
        request_timeout_ms = config.timeouts.request_ms,
        shutdown_grace_ms = config.timeouts.shutdown_grace_ms,
        gateways = config.gateways.len(),
        "Configuration loaded"
    );

    let listener = match net::bind(&config.listener).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, "Cannot start listener");
            return ExitCode::FAILURE;
        }
    };

    let server = match HttpServer::new(config) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, "Cannot build server");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = Shutdown::new();
    if let Err(e) = signals::spawn_signal_listener(shutdown.clone()) {
        tracing::error!(error = %e, "Cannot install signal handlers");
        return ExitCode::FAILURE;
    }

    match server.run(listener, shutdown).await {
        Ok(outcome @ ShutdownOutcome::Forced { .. }) => {
            tracing::error!(?outcome, "Forcing exit with requests still in flight");
            // Skip runtime teardown; it blocks on pending resolver threads.
            std::process::exit(i32::from(outcome.exit_code()))
        }
        Ok(outcome) => {
            tracing::info!(?outcome, "Shutdown complete");
            ExitCode::from(outcome.exit_code())
        }
        Err(e) => {
            tracing::error!(error = %e, "Server failed");
            ExitCode::FAILURE
        }
    }
}
