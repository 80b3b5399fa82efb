pub mod response;

use crate::config::{Config, StoreBackend};
use crate::db;
use crate::error::AppError;
use crate::features;
use crate::ingest::{MemoryReadingStore, PgReadingStore, ReadingStore};
use crate::middleware;
use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;

use self::response::ApiResponse;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ReadingStore>,
}

/// Open the configured reading store, running migrations for PostgreSQL
pub async fn build_store(config: &Config) -> anyhow::Result<Arc<dyn ReadingStore>> {
    match config.server.store {
        StoreBackend::Postgres => {
            let pool = db::create_pool(&config.database).await?;
            db::run_migrations(&pool).await?;
            Ok(Arc::new(PgReadingStore::new(pool)))
        },
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory reading store; uploads are lost on restart");
            Ok(Arc::new(MemoryReadingStore::new()))
        },
    }
}

pub async fn serve(
    config: Config,
    store: Arc<dyn ReadingStore>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = create_router(store, &config);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

/// Create the application router with all routes and middleware
pub fn create_router(store: Arc<dyn ReadingStore>, config: &Config) -> Router {
    let api_v1 = features::router(store.clone());

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .with_state(AppState { store })
        .nest("/api/v1", api_v1)
        // Apply layers from innermost to outermost
        .layer(DefaultBodyLimit::max(config.server.max_upload_bytes))
        .layer(CompressionLayer::new())
        .layer(middleware::tracing_layer())
        .layer(middleware::cors_layer(&config.cors))
}

async fn root() -> impl IntoResponse {
    Json(json!({
        "name": "Trafo Server",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

async fn health(State(state): State<AppState>) -> Result<Response, AppError> {
    state.store.ping().await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(json!({
            "status": "healthy",
            "store": "connected"
        }))),
    )
        .into_response())
}
