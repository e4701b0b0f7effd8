//! TFS Data Store Server
//!
//! Serves one JSON document per site resource (sessions, sponsors,
//! magazines, events, luminaries) and the read-only bootstrap data files.
//!
//! # Configuration
//!
//! Environment variables:
//! - `TFS_PORT`: Port to listen on (default: 8080)
//! - `TFS_DATA_DIR`: Directory to store documents (default: ~/.local/share/tfs-server)
//! - `TFS_STATIC_DIR`: Directory served under `/data` (default: ./data)
//! - `PING_MESSAGE`: Reply of `GET /api/ping` (default: "ping")
//!
//! # Endpoints
//!
//! - `GET /health`: Health check
//! - `GET /api/ping`: Ping
//! - `GET /api/{resource}`: Full document
//! - `POST /api/{resource}`: Overwrite document
//! - `GET /api/{resource}/sync?lastModified=T`: Staleness probe
//! - `GET /data/{file}`: Static bootstrap files

use std::net::SocketAddr;
use std::path::PathBuf;
use tfs_site::server::{router, AppState, DocumentStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Server configuration
#[derive(Debug, Clone)]
struct Config {
    /// Port to listen on
    port: u16,
    /// Directory to store resource documents
    data_dir: PathBuf,
    /// Directory served under `/data`
    static_dir: PathBuf,
    /// Reply of the ping endpoint
    ping_message: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Self {
        let port = std::env::var("TFS_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let data_dir = std::env::var("TFS_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::data_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("tfs-server")
            });

        let static_dir = std::env::var("TFS_STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data"));

        let ping_message = std::env::var("PING_MESSAGE").unwrap_or_else(|_| "ping".to_string());

        Self {
            port,
            data_dir,
            static_dir,
            ping_message,
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tfs_server=info,tfs_site=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    // Ensure data directory exists
    if let Err(e) = std::fs::create_dir_all(&config.data_dir) {
        tracing::error!("Failed to create data directory: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Data directory: {}", config.data_dir.display());
    tracing::info!("Static directory: {}", config.static_dir.display());

    let state = AppState::new(DocumentStore::new(&config.data_dir), config.ping_message);
    let app = router(state, &config.static_dir);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Starting server on {}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
