//! Event-registration front controller, served by an embedded host.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ───────────────▶ http::server ──▶ http::host (path → HostQuery, posts)
//!                                            │
//!                                            ▼
//!                      ┌──────────── dispatch::FrontController ────────────┐
//!                      │ init → parse → routes → pre-render → enqueue      │
//!                      │   → head → notices → template → response          │
//!                      │                                                    │
//!                      │  request    routing    assets    templates        │
//!                      └────────────────────────────────────────────────────┘
//!                                            │
//!     Client Response                        ▼
//!     ◀─────────────── layout of the selected template
//!
//!     Cross-cutting: config, observability (tracing, metrics), lifecycle, admin
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use espresso_front::config::{load_config, FrontConfig};
use espresso_front::http::HttpServer;
use espresso_front::lifecycle::{wait_for_signal, Shutdown};
use espresso_front::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "espresso-front")]
#[command(about = "Event registration front controller", long_about = None)]
struct Args {
    /// TOML configuration file; built-in defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => FrontConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    logging::init(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "espresso-front starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        modules = config.modules.len(),
        posts = config.posts.len(),
        admin = config.admin.enabled,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let signals = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        signals.trigger();
    });

    HttpServer::new(config).run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
