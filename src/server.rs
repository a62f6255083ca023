//! HTTP API.
//!
//! Thin JSON adapters over [`Assistant`]. Handlers parse the body, call the
//! assistant, and translate failures.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Health check (returns version) |
//! | `POST` | `/query` | Answer a question from retrieved context |
//! | `POST` | `/upsert` | Embed and store a batch of documents |
//! | `GET`  | `/stats` | Vector index size |
//!
//! # Error Contract
//!
//! ```json
//! { "detail": "generation failed: Anthropic API error 401 Unauthorized: ..." }
//! ```
//!
//! Bodies that fail to parse (bad JSON, missing fields, `top_k` of zero) are
//! rejected with axum's status for the rejection, 422 for shape errors.
//! Every failure from the embedder, index, or language model is a 500.
//!
//! # CORS
//!
//! `[server].cors_allow_any` (the default) permits all origins, methods, and
//! headers. Turn it off and list `cors_origins` for anything public-facing.

use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};

use crate::config::{Config, ServerConfig};
use crate::models::{Document, IndexStats, Query, QueryResponse};
use crate::rag::Assistant;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
struct AppState {
    assistant: Assistant,
}

/// Build the router with all routes and the configured CORS policy.
pub fn router(assistant: Assistant, server: &ServerConfig) -> anyhow::Result<Router> {
    let app = Router::new()
        .route("/", get(handle_health))
        .route("/query", post(handle_query))
        .route("/upsert", post(handle_upsert))
        .route("/stats", get(handle_stats))
        .layer(cors_layer(server)?)
        .with_state(AppState { assistant });

    Ok(app)
}

fn cors_layer(server: &ServerConfig) -> anyhow::Result<CorsLayer> {
    if server.cors_allow_any {
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any));
    }

    let origins = server
        .cors_origins
        .iter()
        .map(|o| {
            o.parse::<HeaderValue>()
                .with_context(|| format!("invalid CORS origin: {}", o))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]))
}

/// Serve the API on `[server].bind` until the process is terminated.
pub async fn run_server(config: &Config, assistant: Assistant) -> anyhow::Result<()> {
    let app = router(assistant, &config.server)?;

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind))?;

    if config.server.cors_allow_any {
        warn!("CORS allows any origin; set server.cors_allow_any = false in production");
    }
    info!("Jarvis listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    detail: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { detail: self.detail })).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        warn!(error = %format!("{:#}", err), "request failed");
        AppError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: format!("{:#}", err),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError {
            status: rejection.status(),
            detail: rejection.body_text(),
        }
    }
}

// ============ GET / ============

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    message: &'static str,
    version: &'static str,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "online",
        message: "Jarvis AI Assistant API is running",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ============ POST /query ============

async fn handle_query(
    State(state): State<AppState>,
    payload: Result<Json<Query>, JsonRejection>,
) -> Result<Json<QueryResponse>, AppError> {
    let Json(query) = payload?;
    let response = state
        .assistant
        .answer(&query.question, query.top_k.map(|k| k.get()))
        .await?;

    info!(sources = response.sources.len(), "answered query");
    Ok(Json(response))
}

// ============ POST /upsert ============

#[derive(Serialize)]
struct UpsertResponse {
    status: &'static str,
    documents_added: usize,
}

async fn handle_upsert(
    State(state): State<AppState>,
    payload: Result<Json<Vec<Document>>, JsonRejection>,
) -> Result<Json<UpsertResponse>, AppError> {
    let Json(documents) = payload?;
    let documents_added = state.assistant.ingest(documents).await?;

    Ok(Json(UpsertResponse {
        status: "success",
        documents_added,
    }))
}

// ============ GET /stats ============

async fn handle_stats(State(state): State<AppState>) -> Result<Json<IndexStats>, AppError> {
    Ok(Json(state.assistant.stats().await?))
}
