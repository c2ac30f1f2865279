//! Clinic gate
//!
//! Language-aware access gate in front of the clinic web application.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ gate middleware ──▶ redirect (307) ─────────────▶ Client
//!                     │  classifier     │
//!                     │  resolver       └─▶ rewrite / pass ──▶ upstream app
//!                     │  access policy
//!                     │  decision rules
//!                     └─ Set-Cookie: language (only when it changed)
//!
//!     Cross-cutting: config (+ hot reload), observability, admin API, lifecycle
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use clinic_gate::admin::setup_admin_router;
use clinic_gate::config::{load_config, watcher::ConfigWatcher, GateConfig};
use clinic_gate::lifecycle::{shutdown_on_signal, Shutdown};
use clinic_gate::observability::{logging::init_logging, metrics::init_metrics};
use clinic_gate::GateServer;

#[derive(Parser)]
#[command(name = "clinic-gate")]
#[command(about = "Language and access gate for the clinic web application", long_about = None)]
struct Args {
    /// TOML configuration file. Watched for changes when given.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => GateConfig::default(),
    };

    init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "clinic-gate starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.address,
        languages = ?config.locale.supported,
        default_language = %config.locale.default,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let server = GateServer::new(config.clone())?;
    let shutdown = Shutdown::new();
    tokio::spawn(shutdown_on_signal(shutdown.clone()));

    // The watcher must outlive the server.
    let (_watcher, config_updates) = match &args.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), updates)
        }
        None => {
            let (_, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    if config.admin.enabled {
        if config.admin.api_key == GateConfig::default().admin.api_key {
            tracing::warn!("Admin API is enabled with the default API key");
        }
        let admin_listener = TcpListener::bind(&config.admin.bind_address).await?;
        tracing::info!(address = %admin_listener.local_addr()?, "Admin API listening");

        let admin_router = setup_admin_router(server.state());
        let mut admin_shutdown = shutdown.subscribe();
        tokio::spawn(async move {
            let served = axum::serve(admin_listener, admin_router)
                .with_graceful_shutdown(async move {
                    let _ = admin_shutdown.recv().await;
                })
                .await;
            if let Err(e) = served {
                tracing::error!(error = %e, "Admin API stopped");
            }
        });
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    server
        .run(listener, config_updates, shutdown.subscribe())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
