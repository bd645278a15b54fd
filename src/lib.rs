pub mod api;
pub mod config;
pub mod db;
pub mod middleware;
pub mod server;

use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Server error: {0}")]
    Server(String),
}

/// Open the configured database. A missing URL or a failed connection leaves
/// the server without a store; `/test` reports that state.
pub async fn connect_database(config: &config::Config) -> Option<Arc<dyn db::Repository>> {
    let url = config.database.url.as_deref()?;

    info!("Opening database at {}", url);
    match db::SqliteRepository::new(
        url,
        config.database.name.clone(),
        config.database.max_connections,
    )
    .await
    {
        Ok(repo) => {
            let repo: Arc<dyn db::Repository> = Arc::new(repo);
            Some(repo)
        }
        Err(e) => {
            warn!("Database unavailable, continuing without it: {}", e);
            None
        }
    }
}

pub async fn run(config_path: Option<&str>, debug_logs: bool) -> Result<(), ServerError> {
    let config = config::Config::load(config_path)?;

    match config_path {
        Some(path) => info!("Using config file: {}", path),
        None => info!("No config file, using defaults and environment"),
    }
    if debug_logs {
        info!("Debug logging enabled");
    }

    let db = connect_database(&config).await;
    if db.is_none() {
        info!("Running without a database");
    }

    let addr: SocketAddr = config
        .listen_addr()
        .parse()
        .map_err(|e| ServerError::Server(format!("Invalid address: {}", e)))?;

    let state = server::AppState::new(config, db.clone());
    let app = server::build_router(state);

    info!("Serving HTTP on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::Server(format!("Failed to bind: {}", e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServerError::Server(format!("Server error: {}", e)))?;

    if let Some(db) = db {
        db.close().await;
    }

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
