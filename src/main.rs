//! Taskboard API server.
//!
//! # Environment Variables
//!
//! - `STORAGE_MODE`: `in_memory` (default) | `postgres`
//! - `DATABASE_URL`: `PostgreSQL` connection URL (required when `STORAGE_MODE=postgres`)
//! - `DATABASE_MAX_CONNECTIONS`: pool size (default: 5)
//! - `RUST_LOG`: Logging level (e.g., `debug`, `info`, `taskboard=debug`)
//! - `LOG_FORMAT`: `text` (default) | `json`
//! - `HOST`: Server host address (default: `0.0.0.0`)
//! - `PORT`: Server port (default: `3000`)
//! - `WORKER_THREADS`: Number of tokio worker threads, at least 1 (default: logical CPU count)

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taskboard::api::{AppState, create_router};
use taskboard::application::TaskService;
use taskboard::infrastructure::{LogFormat, RepositoryConfig, RepositoryFactory, ServerConfig};

fn main() {
    dotenvy::dotenv().ok();

    // Tracing is not installed yet, so this is the one place that prints.
    let server_config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(error) => {
            eprintln!("Configuration error: {error}");
            std::process::exit(1);
        }
    };
    init_tracing(server_config.log_format);

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Some(threads) = server_config.worker_threads {
        builder.worker_threads(threads.get());
    }

    let runtime = match builder.build() {
        Ok(runtime) => runtime,
        Err(error) => {
            tracing::error!(%error, "Failed to create tokio runtime");
            std::process::exit(1);
        }
    };
    runtime.block_on(async_main(server_config));
}

/// Installs the global subscriber; the format is fixed for the process lifetime.
fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "taskboard=debug,tower_http=debug".into());
    let json = (format == LogFormat::Json).then(|| tracing_subscriber::fmt::layer().json());
    let text = (format == LogFormat::Text).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(text)
        .init();
}

async fn async_main(server_config: ServerConfig) {
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        worker_threads = ?server_config.worker_threads,
        "Starting taskboard"
    );

    let config = match RepositoryConfig::from_env() {
        Ok(config) => config,
        Err(error) => {
            tracing::error!(%error, "Configuration error");
            std::process::exit(1);
        }
    };

    tracing::info!(storage_mode = ?config.storage_mode, "Repository configuration loaded");

    let store = match RepositoryFactory::new(config).create().await {
        Ok(store) => store,
        Err(error) => {
            tracing::error!(%error, "Failed to initialize task store");
            std::process::exit(1);
        }
    };

    let application = create_router(AppState::new(TaskService::new(store)));

    let address = match server_config.socket_addr() {
        Ok(address) => address,
        Err(error) => {
            tracing::error!(%error, "Invalid server address");
            std::process::exit(1);
        }
    };

    let listener = match TcpListener::bind(address).await {
        Ok(listener) => listener,
        Err(error) => {
            tracing::error!(%error, %address, "Failed to bind");
            std::process::exit(1);
        }
    };

    match listener.local_addr() {
        Ok(address) => tracing::info!(%address, "Listening"),
        Err(error) => tracing::warn!(%error, "Could not determine local address"),
    }

    if let Err(error) = axum::serve(listener, application)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(%error, "Server error");
        std::process::exit(1);
    }

    tracing::info!("Server shutdown complete");
}

/// Completes on the first of SIGINT or SIGTERM.
async fn shutdown_signal() {
    let signal = tokio::select! {
        () = interrupt() => "SIGINT",
        () = terminate() => "SIGTERM",
    };
    tracing::info!(signal, "Shutting down gracefully");
}

/// Waits for Ctrl+C. Never completes if the handler cannot be installed.
async fn interrupt() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(%error, "Ctrl+C handler unavailable");
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn terminate() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut stream) => {
            stream.recv().await;
        }
        Err(error) => {
            tracing::warn!(%error, "SIGTERM handler unavailable");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}
