//! HTTP server for media cache endpoints
//!
//! Provides /health, /image?url=..., and DELETE /cache.

use crate::types::{HealthResponse, ImageQuery, PurgeResponse};
use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{delete, get},
    Router,
};
use blob_loader::{FetchCoordinator, Fetcher, ImageDecoder};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

/// Shared state for the HTTP server
pub struct ServerState<F> {
    pub coordinator: FetchCoordinator<F, ImageDecoder>,
    pub started_at: DateTime<Utc>,
}

impl<F: Fetcher> ServerState<F> {
    pub fn new(coordinator: FetchCoordinator<F, ImageDecoder>) -> Self {
        Self {
            coordinator,
            started_at: Utc::now(),
        }
    }
}

pub type SharedState<F> = Arc<ServerState<F>>;

/// Error response
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Create the HTTP router
pub fn create_router<F: Fetcher + 'static>(state: SharedState<F>) -> Router {
    Router::new()
        .route("/health", get(health::<F>))
        .route("/image", get(get_image::<F>))
        .route("/cache", delete(purge_cache::<F>))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server<F: Fetcher + 'static>(
    state: SharedState<F>,
    port: u16,
) -> std::io::Result<()> {
    let router = create_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await
}

/// Health check endpoint
async fn health<F: Fetcher + 'static>(State(state): State<SharedState<F>>) -> Json<HealthResponse> {
    let cache_stats = state.coordinator.store().stats().await;
    let uptime_secs = (Utc::now() - state.started_at).num_seconds() as u64;

    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs,
        cache: cache_stats,
    })
}

/// Get an image by its source URL, through the cache
async fn get_image<F: Fetcher + 'static>(
    State(state): State<SharedState<F>>,
    Query(query): Query<ImageQuery>,
) -> Response {
    match state.coordinator.try_resolve(&query.url).await {
        Ok(resolved) => {
            let cache_header = if resolved.from_cache { "HIT" } else { "MISS" };

            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, resolved.value.format.content_type())
                .header(header::CACHE_CONTROL, "public, max-age=86400")
                .header("X-Cache", cache_header)
                .body(Body::from(resolved.value.bytes))
                .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
        }
        Err(e) if e.is_invalid_identifier() => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Invalid image URL".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            warn!(url = %query.url, error = %e, "Failed to resolve image");
            (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: "Image not found".to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// Remove every cached image
async fn purge_cache<F: Fetcher + 'static>(State(state): State<SharedState<F>>) -> Response {
    match state.coordinator.store().evict_all().await {
        Ok(removed) => Json(PurgeResponse { removed }).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to purge cache");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to purge cache".to_string(),
                }),
            )
                .into_response()
        }
    }
}
