use anyhow::Result;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

use menu_api_server::config::{Settings, StorageBackendKind};
use menu_api_server::database::{DbPool, PgMenuRepository};
use menu_api_server::services::{ArtifactSync, MenuService};
use menu_api_server::storage::create_storage;
use menu_api_server::utils::logger::init_logger;
use menu_api_server::{build_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let settings = Settings::load()?;

    // Initialize logging
    init_logger(&settings.logging)?;
    info!("Starting Menu API Server...");

    // Initialize database pool
    let db_pool = DbPool::new(&settings.database).await?;
    info!("Database connection established");

    if settings.database.run_migrations {
        db_pool.run_migrations().await?;
    }

    let repository = Arc::new(PgMenuRepository::new(db_pool.clone()));

    // Object storage + QR sync
    let storage = create_storage(&settings.storage)?;
    info!("Object storage backend: {:?}", settings.storage.backend);

    let artifact_sync = Arc::new(ArtifactSync::from_config(&settings.qr, storage)?);
    let menu_service = Arc::new(MenuService::new(repository, artifact_sync));

    let mut state = AppState::new(menu_service);
    if settings.storage.backend == StorageBackendKind::Local {
        if let Some(root) = &settings.storage.local_root {
            info!("Serving local QR artifacts from {}", root);
            state = state.with_artifact_dir(root);
        }
    }

    let app = build_router(state);

    let addr = SocketAddr::from((
        settings.server.host.parse::<IpAddr>()?,
        settings.server.port,
    ));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped, closing database pool");
    db_pool.close().await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
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
