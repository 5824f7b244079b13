//! User account service.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client ──▶ request id / trace / timeout / body limit
//!                 ──▶ metrics ──▶ recover ──▶ CORS ──▶ rate limit ──▶ authenticate
//!                                                                       │
//!                                                                       ▼
//!                                                          handlers ──▶ UserService
//!                                                                       │
//!                                                                       ▼
//!                                                       DeadlineStore ──▶ Postgres | memory
//! ```

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use user_service::config::{self, Args, ServiceConfig};
use user_service::http::HttpServer;
use user_service::lifecycle::{signals, Shutdown};
use user_service::observability::{logging, metrics};
use user_service::users::{DeadlineStore, MemoryUserStore, PgUserStore, UserStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = config::resolve(&args)?;

    logging::init_logging(&config.observability)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        "user-service starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start Prometheus exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let store = open_store(&config).await?;

    let listener = TcpListener::bind(config.bind_address()).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    signals::forward_signals(&shutdown);

    HttpServer::new(config, store).run(listener, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn open_store(config: &ServiceConfig) -> Result<Arc<dyn UserStore>, Box<dyn std::error::Error>> {
    let inner: Arc<dyn UserStore> = match &config.database.dsn {
        Some(dsn) if !dsn.trim().is_empty() => {
            Arc::new(PgUserStore::connect(&config.database, dsn).await?)
        }
        _ => {
            tracing::warn!("No database DSN configured, using in-memory user store");
            Arc::new(MemoryUserStore::new())
        }
    };

    let timeout = Duration::from_secs(config.timeouts.store_secs);
    Ok(Arc::new(DeadlineStore::new(inner, timeout)))
}
