//! HTTP handlers for the resource store.
//!
//! One endpoint triplet per resource:
//!
//! - `GET /api/{resource}`: full document
//! - `POST /api/{resource}`: overwrite with `{ data: Document }`
//! - `GET /api/{resource}/sync?lastModified=T`: staleness probe
//!
//! Plus `GET /api/ping`, `GET /health` and static files under `/data`.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use std::path::Path as FsPath;
use std::sync::Arc;
use tfs_core::{ApiResponse, Document, ResourceKind, SaveRequest, SyncProbe, SyncQuery};
use tokio::sync::RwLock;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use super::storage::{DocumentStore, StoreError};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<DocumentStore>>,
    pub ping_message: Arc<str>,
}

impl AppState {
    pub fn new(store: DocumentStore, ping_message: impl Into<Arc<str>>) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            ping_message: ping_message.into(),
        }
    }
}

/// Builds the router. `static_dir` is served read-only under `/data`.
pub fn router(state: AppState, static_dir: impl AsRef<FsPath>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/ping", get(ping))
        .route("/api/{resource}", get(get_document).post(save_document))
        .route("/api/{resource}/sync", get(sync_probe))
        .nest_service("/data", ServeDir::new(static_dir.as_ref()))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn failure(status: StatusCode, error: impl Into<String>) -> Response {
    (status, Json(ApiResponse::<()>::failure(error))).into_response()
}

fn resolve(resource: &str) -> Result<ResourceKind, Response> {
    DocumentStore::resolve(resource).map_err(|e| failure(StatusCode::NOT_FOUND, e.to_string()))
}

fn storage_failure(kind: ResourceKind, e: StoreError) -> Response {
    tracing::error!("Storage error for {}: {}", kind, e);
    failure(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct PingResponse {
    message: String,
}

async fn ping(State(state): State<AppState>) -> Json<PingResponse> {
    Json(PingResponse {
        message: state.ping_message.to_string(),
    })
}

async fn get_document(State(state): State<AppState>, Path(resource): Path<String>) -> Response {
    let kind = match resolve(&resource) {
        Ok(kind) => kind,
        Err(response) => return response,
    };

    let store = state.store.read().await;
    match store.load_or_empty(kind) {
        Ok(doc) => Json(ApiResponse::ok(doc)).into_response(),
        Err(e) => storage_failure(kind, e),
    }
}

async fn save_document(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    payload: Result<Json<SaveRequest<Document<Value>>>, JsonRejection>,
) -> Response {
    let kind = match resolve(&resource) {
        Ok(kind) => kind,
        Err(response) => return response,
    };

    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            tracing::warn!("Rejected {} save: {}", kind, rejection.body_text());
            return failure(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    let store = state.store.write().await;
    match store.save(kind, request.data) {
        Ok(saved) => {
            tracing::info!(
                "Saved {} ({} items, lastModified {})",
                kind,
                saved.items.len(),
                saved.last_modified
            );
            Json(ApiResponse::ok(saved).with_message(format!("{} saved", kind))).into_response()
        }
        Err(e) => storage_failure(kind, e),
    }
}

async fn sync_probe(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    query: Result<Query<SyncQuery>, QueryRejection>,
) -> Response {
    let kind = match resolve(&resource) {
        Ok(kind) => kind,
        Err(response) => return response,
    };

    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(SyncProbe {
                    success: false,
                    needs_update: false,
                    error: Some(rejection.body_text()),
                }),
            )
                .into_response();
        }
    };

    let store = state.store.read().await;
    match store.needs_update(kind, query.last_modified) {
        Ok(needs_update) => Json(SyncProbe {
            success: true,
            needs_update,
            error: None,
        })
        .into_response(),
        Err(e) => storage_failure(kind, e),
    }
}
