mod api;

use crate::config::Config;
use axum::{http::Method, Extension, Router, Server};
use folio_core::PublicViewer;
use folio_logger::{error, info};
use folio_storage::FolioStorage;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub struct Context {
    pub storage: Arc<FolioStorage>,
    pub viewer: PublicViewer<FolioStorage, FolioStorage>,
    /// Shared with the checkout integration; token issuing is disabled
    /// over HTTP without it.
    pub grant_secret: Option<String>,
}

impl Context {
    pub fn new(storage: FolioStorage) -> Self {
        let storage = Arc::new(storage);
        Self {
            viewer: PublicViewer::new(storage.clone(), storage.clone()),
            storage,
            grant_secret: None,
        }
    }

    pub fn with_grant_secret(mut self, secret: Option<String>) -> Self {
        self.grant_secret = secret;
        self
    }

    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let storage = match &config.data {
            Some(path) => {
                info!("use snapshot file: {}", path.display());
                FolioStorage::open(path).await?
            }
            None => {
                info!("use in-memory storage");
                FolioStorage::new()
            }
        };
        if config.grant_secret.is_none() {
            info!("FOLIO_GRANT_SECRET unset, access grants are disabled over http");
        }
        Ok(Self::new(storage).with_grant_secret(config.grant_secret.clone()))
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("failed to install signal handler: {e}");
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

    info!("Shutdown signal received, starting graceful shutdown");
}

pub fn make_router(context: Arc<Context>) -> Router {
    api::public_handler(api::api_handler(Router::new())).layer(Extension(context))
}

pub async fn start_server(config: Config) -> anyhow::Result<()> {
    let cors = CorsLayer::new()
        .allow_methods(vec![
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_origin(config.cors_origins.clone())
        .allow_headers(Any);

    let context = Arc::new(Context::from_config(&config).await?);

    let app = make_router(context)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    info!("listening on {}", config.listen);

    if let Err(e) = Server::bind(&config.listen)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server shutdown due to error: {}", e);
    }

    info!("Server shutdown complete");
    Ok(())
}
