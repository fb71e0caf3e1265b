// Print kiosk intake server: quotes, image layouts and the print queue.

use actix_files as fs;
use actix_web::{middleware, web, App, HttpServer};
use std::sync::Arc;
use tracing::{error, info};

use print_kiosk::composer::DocumentComposer;
use print_kiosk::config::Config;
use print_kiosk::documents::{DocumentSource, PdfDocumentSource};
use print_kiosk::errors::AppError;
use print_kiosk::render::{FileImageSource, RasterRenderer};
use print_kiosk::routes;
use print_kiosk::session::SessionStore;

// ============================================================================
// Application State
// ============================================================================

/// Centralized application state container
#[derive(Clone)]
struct AppState {
    config: Config,
    sessions: SessionStore,
    composer: DocumentComposer,
    documents: Arc<dyn DocumentSource>,
}

impl AppState {
    async fn new(config: Config) -> Result<Self, AppError> {
        info!("Initializing application state");

        for dir in [config.uploads_path(), config.outputs_path()] {
            tokio::fs::create_dir_all(&dir).await.map_err(|e| {
                AppError::Initialization(format!("Failed to create {:?}: {}", dir, e))
            })?;
        }

        let composer = DocumentComposer::new(
            Arc::new(FileImageSource::new(config.uploads_path())),
            Arc::new(RasterRenderer::new(config.render.dpi)),
        );
        let documents: Arc<dyn DocumentSource> =
            Arc::new(PdfDocumentSource::new(config.uploads_path()));

        info!(
            "Uploads read from {:?}, layouts written to {:?} at {} DPI",
            config.uploads_path(),
            config.outputs_path(),
            config.render.dpi
        );

        Ok(Self {
            config,
            sessions: SessionStore::new(),
            composer,
            documents,
        })
    }
}

// ============================================================================
// Shutdown Handling
// ============================================================================

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
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

// ============================================================================
// Main Entry Point
// ============================================================================

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting print kiosk");

    let config = Config::from_env().map_err(|e| {
        error!("Configuration error: {}", e);
        std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("Failed to load configuration: {}", e),
        )
    })?;

    let socket_addr = config.socket_addr().map_err(|e| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("Invalid bind address: {}", e),
        )
    })?;
    info!("Server will bind to: {}", socket_addr);

    let app_state = AppState::new(config).await.map_err(|e| {
        error!("Application initialization error: {}", e);
        std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("Failed to initialize application: {}", e),
        )
    })?;

    let state = app_state.clone();
    let server = HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .wrap(middleware::NormalizePath::trim())
            .app_data(web::Data::new(state.config.clone()))
            .app_data(web::Data::new(state.sessions.clone()))
            .app_data(web::Data::new(state.composer.clone()))
            .app_data(web::Data::new(state.documents.clone()))
            .configure(routes::configure)
            .service(fs::Files::new("/outputs", state.config.outputs_path()))
    })
    .bind(socket_addr)?
    .shutdown_timeout(5)
    .run();

    let server_handle = server.handle();
    let server_task = tokio::spawn(async move { server.await });

    info!("Print kiosk listening on {}", socket_addr);

    shutdown_signal().await;

    info!("Initiating graceful shutdown...");
    server_handle.stop(true).await;

    server_task.await.map_err(|e| {
        std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("Server task error: {}", e),
        )
    })??;

    info!("Graceful shutdown complete");
    Ok(())
}
