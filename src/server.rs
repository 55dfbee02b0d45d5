//! HTTP layer serving the chart payload.

use crate::analysis::PayloadAssembler;
use crate::models::Payload;
use crate::source::DatasetCache;
use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::{Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<DatasetCache>,
    pub assembler: Arc<PayloadAssembler>,
}

impl AppState {
    pub fn new(cache: DatasetCache, assembler: PayloadAssembler) -> Self {
        Self {
            cache: Arc::new(cache),
            assembler: Arc::new(assembler),
        }
    }
}

/// Health check endpoint. Never touches the dataset.
async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "grammy-charts"
    }))
}

/// Build the payload from the cached dataset.
async fn grammy_payload(State(state): State<AppState>) -> Response {
    match build_payload(&state).await {
        Ok(payload) => Json(payload).into_response(),
        Err(e) => {
            error!("Failed to serve payload: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

async fn build_payload(state: &AppState) -> Result<Payload> {
    let snapshot = state.cache.get().await?;
    let assembler = Arc::clone(&state.assembler);

    let payload = tokio::task::spawn_blocking(move || {
        assembler.assemble_with_roles(&snapshot.dataset, &snapshot.roles)
    })
    .await
    .context("Payload assembly task failed")?;

    Ok(payload)
}

/// Drop the cached dataset and start loading it again in the background.
async fn reload(State(state): State<AppState>) -> impl IntoResponse {
    state.cache.invalidate().await;

    let cache = Arc::clone(&state.cache);
    tokio::spawn(async move {
        if let Err(e) = cache.get().await {
            warn!("Background dataset reload failed: {}", e);
        }
    });

    Json(json!({ "status": "reloading" }))
}

/// Create the router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/grammy", get(grammy_payload))
        .route("/api/grammy/reload", post(reload))
        .layer(cors)
        .with_state(state)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let source = state.cache.source().to_string();
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Serving payload for {} on {}", source, addr);
    println!("🚀 HTTP server running on http://{}", addr);
    println!("💚 Health check: http://{}/health", addr);
    println!("📊 Payload:      http://{}/api/grammy", addr);

    axum::serve(listener, app).await.context("HTTP server failed")?;

    Ok(())
}
