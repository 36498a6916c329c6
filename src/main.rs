//! Demo service for the request-context logger.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ request_context ──▶ tenant_context ──▶ request_logging ──▶ handler
//!                      (X-Request-ID)      (X-Tenant-ID)      ("request started")
//!                                                                    │
//!     Client Response                                                ▼
//!     ◀────────────── X-Request-ID echoed ◀── observed body ──▶ completion record
//! ```
//!
//! Records go to stdout: text with caller locations in development, JSON otherwise. The
//! service's own diagnostics go through `tracing`.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use context_logger::config::{load_config, validate_config, ConfigError, ServiceConfig};
use context_logger::http::{HttpServer, REQUEST_ID_KEY, TENANT_KEY};
use context_logger::lifecycle::{signals, Shutdown};
use context_logger::logging::{ContextKeys, Logger, LoggerOptions};
use context_logger::observability;

#[derive(Debug, Parser)]
#[command(name = "context-logger")]
#[command(about = "Demo HTTP service with request-context structured logging", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address
    #[arg(long)]
    bind: Option<String>,

    /// Override logging.environment
    #[arg(long)]
    environment: Option<String>,

    /// Override logging.level
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn load(&self) -> Result<ServiceConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => ServiceConfig::default(),
        };

        if let Some(bind) = &self.bind {
            config.listener.bind_address = bind.clone();
        }
        if let Some(environment) = &self.environment {
            config.logging.environment = environment.clone();
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = cli.load()?;

    let options = LoggerOptions::from(&config.logging).context_keys(
        ContextKeys::new()
            .with(&REQUEST_ID_KEY, "request_id")
            .with(&TENANT_KEY, "tenant"),
    );
    observability::init_tracing(options.level.as_str(), !options.is_development())?;

    tracing::info!(
        bind_address = %config.listener.bind_address,
        environment = %options.environment,
        level = %options.level,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let logger = Logger::from_options(&options);

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    signals::spawn_signal_listener(shutdown);

    HttpServer::new(config, logger).run(listener, receiver).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
