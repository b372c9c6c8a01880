use std::sync::Arc;
use tokio::signal;
use tracing::info;

use truths_core::{FramePresenter, GameStore, MemoryStore};
use truths_persistence::{DatabaseStore, connect_and_migrate};
use truths_server::{
    AppState,
    config::{Config, FrameVerification, StoreBackend},
    create_routes,
    verification::FrameVerifier,
};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting Two Truths and a Lie frame server...");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let addr = match config.socket_addr() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let store: Arc<dyn GameStore> = match config.store {
        StoreBackend::Database => {
            // Initialize database connection and run migrations
            let db = match connect_and_migrate(&config.database_url).await {
                Ok(db) => db,
                Err(e) => {
                    tracing::error!("Failed to connect to database and run migrations: {}", e);
                    std::process::exit(1);
                }
            };
            Arc::new(DatabaseStore::new(db))
        }
        StoreBackend::Memory => {
            info!("Using in-memory store - data is lost on shutdown");
            Arc::new(MemoryStore::new())
        }
    };

    let verifier = match config.frame_verification {
        FrameVerification::Dev => {
            info!("Starting in development mode - frame signatures are not verified");
            FrameVerifier::new_dev_mode()
        }
        FrameVerification::Hub => {
            info!("Verifying frame messages against hub {}", config.hub_url);
            FrameVerifier::new(config.hub_url.clone())
        }
    };

    let presenter =
        FramePresenter::new(config.public_url.clone()).with_leaderboard_size(config.leaderboard_size);

    let routes = create_routes(Arc::new(AppState::new(store, presenter, verifier)));

    info!("Server starting on {} (public URL {})", addr, config.public_url);

    let (addr, server) = warp::serve(routes).bind_with_graceful_shutdown(addr, async {
        // Wait for SIGINT (Ctrl+C) or SIGTERM
        #[cfg(unix)]
        {
            let (mut sigint, mut sigterm) = match (
                signal::unix::signal(signal::unix::SignalKind::interrupt()),
                signal::unix::signal(signal::unix::SignalKind::terminate()),
            ) {
                (Ok(sigint), Ok(sigterm)) => (sigint, sigterm),
                _ => {
                    tracing::error!("Failed to install signal handlers; graceful shutdown disabled");
                    std::future::pending::<()>().await;
                    return;
                }
            };

            tokio::select! {
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully...");
                }
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully...");
                }
            }
        }

        #[cfg(not(unix))]
        {
            if signal::ctrl_c().await.is_err() {
                tracing::error!("Failed to listen for ctrl+c; graceful shutdown disabled");
                std::future::pending::<()>().await;
            }
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    });

    info!(
        "Server started successfully on {}. Press Ctrl+C to stop.",
        addr
    );
    server.await;
    info!("Server shutdown complete.");
}
