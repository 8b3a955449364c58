//! Agora API - Main entry point
//!
//! Boots the forum vote backend: resolve configuration, open the
//! database, load the token secret, then serve the HTTP API until a
//! shutdown signal arrives.

use std::net::SocketAddr;
use std::path::PathBuf;

use agora_api::api::{self, AppContext};
use agora_common::{auth, config, db};
use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for agora-api
#[derive(Parser, Debug)]
#[command(name = "agora-api")]
#[command(about = "Forum vote backend for agora")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5730", env = "AGORA_PORT")]
    port: u16,

    /// Folder containing the database (falls back to env, config file, OS default)
    #[arg(short, long, env = "AGORA_DATA_FOLDER")]
    data_folder: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agora_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let data_folder = config::resolve_data_folder(args.data_folder.as_deref(), "AGORA_DATA_FOLDER")
        .context("Failed to resolve data folder")?;
    info!("Data folder: {}", data_folder.display());

    let db_pool = db::init_database(&config::database_path(&data_folder))
        .await
        .context("Failed to initialize database")?;

    let token_secret = auth::load_token_secret(&db_pool)
        .await
        .context("Failed to load token secret")?;

    let max_body_bytes = db::settings::max_body_size_bytes(&db_pool)
        .await
        .context("Failed to load HTTP settings")?;

    let ctx = AppContext::new(db_pool, token_secret, max_body_bytes);
    let app = api::create_router(ctx);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

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
            info!("Received terminate signal, shutting down");
        },
    }
}
