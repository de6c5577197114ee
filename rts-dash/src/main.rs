//! rts-dash - RTS shipment dashboard service
//!
//! Ingests the return-to-sender shipment sheet (or a local CSV export),
//! keeps it refreshed on a fixed period and serves it over HTTP.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rts_common::config::{Overrides, TomlConfig};
use rts_common::{RefreshScheduler, SharedDashboard, SourceResolver};
use rts_dash::{build_router, AppState};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for rts-dash
#[derive(Parser, Debug)]
#[command(name = "rts-dash")]
#[command(about = "Return-to-sender shipment dashboard service")]
#[command(version)]
struct Args {
    /// Config file (default: RTS_CONFIG, then ~/.config/rts-board/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "RTS_PORT")]
    port: Option<u16>,

    /// Address to bind
    #[arg(long, env = "RTS_BIND_ADDRESS")]
    bind_address: Option<String>,

    /// Published spreadsheet id
    #[arg(long, env = "RTS_SHEET_ID")]
    sheet_id: Option<String>,

    /// Spreadsheet tab name
    #[arg(long, env = "RTS_TAB_NAME")]
    tab_name: Option<String>,

    /// Ingest this CSV file instead of fetching the sheet
    #[arg(short, long, env = "RTS_SOURCE_FILE")]
    file: Option<PathBuf>,

    /// Seconds between automatic refreshes
    #[arg(long, env = "RTS_REFRESH_SECS")]
    refresh_secs: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RTS_LOG_LEVEL")]
    log_level: Option<String>,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            port: self.port,
            bind_address: self.bind_address.clone(),
            sheet_id: self.sheet_id.clone(),
            tab_name: self.tab_name.clone(),
            source_file: self.file.clone(),
            interval_secs: self.refresh_secs,
            log_level: self.log_level.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config first: the log level lives in it
    let config = TomlConfig::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?
        .apply_overrides(args.overrides());

    let level = config.logging.level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("rts_dash={level},rts_common={level},tower_http={level}").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting RTS Board dashboard (rts-dash) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let source = config.resolve_source().context("No data source configured")?;
    info!("Data source: {}", source.label());
    info!("Refresh period: {}s", config.refresh_period().as_secs());

    let resolver = SourceResolver::new(config.fetch_timeout())
        .context("Failed to build HTTP client")?;

    let (refresh, scheduler_task) = RefreshScheduler::new(
        resolver.clone(),
        source,
        SharedDashboard::new(),
        config.refresh_period(),
    )
    .spawn();

    let state = AppState::new(
        refresh.clone(),
        resolver,
        config.sheet.export_base_url.clone(),
    );
    let app = build_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("rts-dash listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    refresh.shutdown().await;
    let _ = scheduler_task.await;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down");
        },
    }
}
