//! tailgate guard daemon
//!
//! Serves a small HTTP API on this host's tailnet address and only
//! answers requests coming from other members of the tailnet.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tg_core::config::{self, GuardConfig};
use tg_core::tailscale::TailscaleCli;
use tg_core::{identity, Peer};
use tg_guard::{protect, DirectoryCache};

#[derive(Parser)]
#[command(name = "tg-guard")]
#[command(about = "tailgate guard daemon")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address (overrides config; defaults to the tailnet interface)
    #[arg(short, long)]
    bind: Option<IpAddr>,

    /// Port to serve on (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| args.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("tailgate guard starting...");

    // Load configuration
    let config = if let Some(config_path) = &args.config {
        config::load_config(config_path)
            .with_context(|| format!("Failed to load config from {:?}", config_path))?
    } else {
        let default_path = config::default_config_path();
        if default_path.exists() {
            config::load_config(&default_path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {:?}: {}", default_path, e);
                GuardConfig::default()
            })
        } else {
            tracing::info!("Using default configuration");
            GuardConfig::default()
        }
    };

    // Resolve our own tailnet identity; the listener binds there so
    // only tailnet traffic ever reaches the gate.
    let me = identity::me().context("this host does not appear to be joined to a tailnet")?;
    tracing::info!("tailnet identity: {} ({})", me.hostname, me.addr);

    let bind_ip = args.bind.or(config.bind_address).unwrap_or(me.addr);
    let port = args.port.unwrap_or(config.port);

    let cache = DirectoryCache::new(TailscaleCli::new(config.fetch_timeout), config.cache_ttl);

    let router = Router::new()
        .route("/whoami", get(whoami))
        .route("/peers", get(peers))
        .with_state(cache.clone());
    let app = protect(router, cache);

    let addr = SocketAddr::new(bind_ip, port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    tracing::info!("guard listening on {}", listener.local_addr()?);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("guard stopped");
    Ok(())
}

/// Report this host's own tailnet identity
async fn whoami() -> Result<Json<Peer>, StatusCode> {
    identity::me().map(Json).map_err(|e| {
        tracing::warn!("failed to resolve own identity: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

/// List the current member directory
async fn peers(State(cache): State<DirectoryCache>) -> Result<Json<Vec<Peer>>, StatusCode> {
    let snapshot = cache.snapshot().await.map_err(|e| {
        tracing::warn!("failed to load member directory: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(Json(snapshot.peers().cloned().collect()))
}

/// Resolve when the process is asked to shut down
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
    }
}
