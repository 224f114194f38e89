// Web server: Axum-based clustering API.
//
// POST /cluster            cluster JSON documents or uploaded files
// GET  /supported-formats  which file formats this build can read
// GET  /health             liveness probe
//
// The embedding model is shared by all requests through AppState and is
// loaded on the first clustering request.

use std::sync::Arc;

use anyhow::Result;
use axum::extract::DefaultBodyLimit;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::embeddings::{Embedder, SharedEmbedder};
use crate::pipeline::PipelineOptions;
use crate::topics::{TfIdfExtractor, TopicExtractor};

pub mod handlers;

/// Largest request body accepted, across all uploaded files.
pub const MAX_CONTENT_LENGTH: usize = 50 * 1024 * 1024;

/// Shared application state threaded through all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub embedder: Arc<dyn Embedder>,
    pub extractor: Arc<dyn TopicExtractor>,
    pub options: PipelineOptions,
}

impl AppState {
    /// Production state: the ONNX model from the configured directory,
    /// loaded on first use.
    pub fn from_config(config: &Config) -> Self {
        Self {
            embedder: Arc::new(SharedEmbedder::from_model_dir(config.embedding_dir())),
            extractor: Arc::new(TfIdfExtractor::default()),
            options: PipelineOptions {
                seed: config.seed,
                ..PipelineOptions::default()
            },
        }
    }
}

/// Start the Axum web server and block until it exits.
pub async fn run_server(config: Config) -> Result<()> {
    let state = AppState::from_config(&config);
    let app = build_router(state);

    let addr = format!("{}:{}", config.bind, config.port);
    info!("doclust listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/cluster", post(handlers::cluster::cluster))
        .route(
            "/supported-formats",
            get(handlers::formats::supported_formats),
        )
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(MAX_CONTENT_LENGTH))
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers([header::CONTENT_TYPE]),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        axum::Json(serde_json::json!({ "status": "ok" })),
    )
}

/// Typed JSON error response helper.
pub fn api_error(status: StatusCode, message: &str) -> Response {
    (status, axum::Json(serde_json::json!({ "error": message }))).into_response()
}
