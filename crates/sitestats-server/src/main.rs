//! sitestats-server - REST API server binary.

use std::net::SocketAddr;

use sitestats_core::config::StoreConfig;
use sitestats_server::{create_server, AppState};
use tokio::signal;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler: {}", e);
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
                error!("failed to install signal handler: {}", e);
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
}

/// Load store configuration from `SITESTATS_CONFIG` if set, then apply env overrides.
fn load_config() -> Result<StoreConfig, Box<dyn std::error::Error>> {
    match std::env::var("SITESTATS_CONFIG") {
        Ok(path) => {
            info!("Loading configuration from {}", path);
            Ok(StoreConfig::from_file(&path)?.with_env_overrides())
        }
        Err(_) => Ok(StoreConfig::from_env()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing; SITESTATS_LOG_FORMAT=json switches to JSON lines
    let json_logs = std::env::var("SITESTATS_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    tracing_subscriber::registry()
        .with((!json_logs).then(|| fmt::layer()))
        .with(json_logs.then(|| fmt::layer().json()))
        .with(
            EnvFilter::from_default_env()
                .add_directive(Level::INFO.into())
                .add_directive("sitestats_server=debug".parse()?),
        )
        .init();

    // Get configuration from environment
    let host = std::env::var("SITESTATS_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("SITESTATS_PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .map_err(|e| format!("SITESTATS_PORT must be a valid port number: {}", e))?;

    let config = load_config()?;
    let state = AppState::open(config)?;
    let app = create_server(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Starting sitestats-server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            info!("Shutdown signal received");
        })
        .await?;

    info!("Server stopped cleanly");
    Ok(())
}
