//! Twin relay server - twin registry, push notifications and phone relay.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use twinrelay_server::{config::Config, logging, routes, state::AppState};

use logging::{LogConfig, LogFormat, LogPreset};

/// Twin relay server.
#[derive(Parser, Debug)]
#[command(name = "twinrelay-server")]
#[command(about = "HTTP/WebSocket server relaying notifications and messages to paired phones")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override bind host (an IP address) from config
    #[arg(long)]
    host: Option<String>,

    /// Override port from config
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging (every relayed frame)
    #[arg(short, long)]
    debug: bool,

    /// Enable trace logging
    #[arg(long)]
    trace: bool,

    /// Quiet mode (WARN and ERROR only)
    #[arg(short, long)]
    quiet: bool,

    /// Set log level for specific targets (e.g., "relay=debug").
    /// Targets are prefixed with "twinrelay::" automatically.
    #[arg(long = "log", value_name = "TARGET=LEVEL")]
    log_overrides: Vec<String>,

    /// Log output format
    #[arg(long = "log-format", value_name = "FORMAT", default_value = "text")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let preset = LogPreset::from_flags(cli.verbose, cli.debug, cli.trace, cli.quiet);
    logging::init(&LogConfig::new(preset, cli.log_format).with_overrides(&cli.log_overrides));

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    tracing::info!(target: "twinrelay::startup", "Loaded configuration ({} seed twins)", config.seed.len());

    let shutdown = CancellationToken::new();
    let addr = config.bind_addr()?;
    let state = Arc::new(AppState::new(config, shutdown.clone())?);
    let app = routes::router(state.clone());

    tracing::info!(target: "twinrelay::startup", "Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tokio::spawn(watch_signals(shutdown.clone()));
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    state.relay.shutdown();
    tracing::info!(target: "twinrelay::startup", "Server stopped");
    Ok(())
}

/// Cancel `shutdown` on Ctrl-C or SIGTERM.
async fn watch_signals(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(target: "twinrelay::startup", "Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(target: "twinrelay::startup", "Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!(target: "twinrelay::startup", "Shutdown signal received");
    shutdown.cancel();
}
