//! REST API over the in-memory entry store.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`    | `/health` | Liveness (`{status, timestamp}`, not enveloped) |
//! | `GET`    | `/api/search?q&type&tags&limit&offset` | Substring search, paginated |
//! | `GET`    | `/api/entries?type&tags&limit&offset` | List with filters, paginated |
//! | `POST`   | `/api/entries` | Create an entry (201) |
//! | `GET`    | `/api/entries/{id}` | Fetch one entry |
//! | `PUT`    | `/api/entries/{id}` | Merge-update an entry |
//! | `DELETE` | `/api/entries/{id}` | Delete an entry |
//! | `POST`   | `/api/ask` | Templated answer over matching entries |
//! | `GET`    | `/api/stats` | Aggregate counts |
//!
//! # Envelope
//!
//! Every `/api` response, success or failure, has the same shape:
//!
//! ```json
//! { "success": true, "data": [], "pagination": { "total": 0, "limit": 10, "offset": 0 } }
//! { "success": false, "error": "Entry not found" }
//! ```
//!
//! Validation failures are 400, unknown ids 404, anything else 500 with a
//! generic message (the cause is logged).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so the web frontend can
//! run on its own dev server.

use std::any::Any;
use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use devkb_core::ask::{ask, AskAnswer};
use devkb_core::models::{EntryPatch, KnowledgeEntry, NewEntry};
use devkb_core::query::{
    parse_tags, search, Page, PageRequest, SearchRequest, TypeFilter, DEFAULT_LIST_LIMIT,
    DEFAULT_SEARCH_LIMIT,
};
use devkb_core::stats::{compute_stats, KbStats, SearchHistory};
use devkb_core::store::memory::InMemoryStore;
use devkb_core::store::{EntryError, EntryStore};

use crate::config::Config;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn EntryStore>,
    history: Arc<SearchHistory>,
}

impl AppState {
    pub fn new(store: Arc<dyn EntryStore>) -> Self {
        Self {
            store,
            history: Arc::new(SearchHistory::new()),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Arc::new(InMemoryStore::new()))
    }
}

/// Builds the API router with tracing, CORS, and panic recovery applied.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods(AnyOrigin)
        .allow_headers(AnyOrigin);

    Router::new()
        .route("/health", get(handle_health))
        .route("/api/search", get(handle_search))
        .route("/api/entries", get(handle_list).post(handle_create))
        .route(
            "/api/entries/{id}",
            get(handle_get).put(handle_update).delete(handle_delete),
        )
        .route("/api/ask", post(handle_ask))
        .route("/api/stats", get(handle_stats))
        .fallback(handle_fallback)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state)
}

/// Starts the API server on `config.server.bind` with an empty store.
///
/// Runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    run_server_with_state(config, AppState::default()).await
}

/// Like [`run_server`], but with a caller-supplied store.
pub async fn run_server_with_state(config: &Config, state: AppState) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    println!("DevKB API server running on http://{}", bind_addr);
    println!("   Health check: http://{}/health", bind_addr);
    tracing::info!(addr = %bind_addr, "server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

// ============ Envelope ============

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

/// Uniform response wrapper: `{success, data?, error?, pagination?}`.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl<T> Envelope<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            pagination: None,
        }
    }

    fn empty() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
            pagination: None,
        }
    }
}

impl<T> Envelope<Vec<T>> {
    fn paged(page: Page<T>) -> Self {
        Self {
            success: true,
            data: Some(page.items),
            error: None,
            pagination: Some(Pagination {
                total: page.total,
                limit: page.page.limit,
                offset: page.page.offset,
            }),
        }
    }
}

// ============ Errors ============

/// A failed request, rendered as `{success: false, error}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Envelope::<()> {
            success: false,
            data: None,
            error: Some(self.message),
            pagination: None,
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> ApiError {
    ApiError {
        status: StatusCode::BAD_REQUEST,
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> ApiError {
    ApiError {
        status: StatusCode::NOT_FOUND,
        message: message.into(),
    }
}

fn internal_error() -> ApiError {
    ApiError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        message: "Internal server error".to_string(),
    }
}

impl From<EntryError> for ApiError {
    fn from(err: EntryError) -> Self {
        match err {
            EntryError::MissingRequired => bad_request(err.to_string()),
            EntryError::NotFound(_) => not_found("Entry not found"),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        bad_request(rejection.body_text())
    }
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!(panic = %detail, "request handler panicked");
    internal_error().into_response()
}

async fn handle_fallback() -> ApiError {
    not_found("Route not found")
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    timestamp: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

// ============ GET /api/search ============

/// Raw query parameters. Numbers stay strings so malformed values fall back
/// to defaults instead of rejecting the request.
#[derive(Debug, Deserialize)]
struct SearchParams {
    q: Option<String>,
    #[serde(rename = "type")]
    entry_type: Option<String>,
    tags: Option<String>,
    limit: Option<String>,
    offset: Option<String>,
}

async fn handle_search(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<Envelope<Vec<KnowledgeEntry>>>, ApiError> {
    let Query(params) = params?;

    let query = match params.q.as_deref() {
        Some(q) if !q.is_empty() => q,
        _ => return Err(bad_request("Search query is required")),
    };
    state.history.record(query);

    let req = SearchRequest {
        query: Some(query),
        entry_type: TypeFilter::from_param(params.entry_type.as_deref()),
        tags: parse_tags(params.tags.as_deref()),
        page: PageRequest::from_params(
            params.limit.as_deref(),
            params.offset.as_deref(),
            DEFAULT_SEARCH_LIMIT,
        ),
    };
    let entries = state.store.list().await?;
    let page = search(entries, &req);
    tracing::debug!(query, total = page.total, "search");

    Ok(Json(Envelope::paged(page)))
}

// ============ GET /api/entries ============

#[derive(Debug, Deserialize)]
struct ListParams {
    #[serde(rename = "type")]
    entry_type: Option<String>,
    tags: Option<String>,
    limit: Option<String>,
    offset: Option<String>,
}

async fn handle_list(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Envelope<Vec<KnowledgeEntry>>>, ApiError> {
    let Query(params) = params?;

    let req = SearchRequest {
        query: None,
        entry_type: TypeFilter::from_param(params.entry_type.as_deref()),
        tags: parse_tags(params.tags.as_deref()),
        page: PageRequest::from_params(
            params.limit.as_deref(),
            params.offset.as_deref(),
            DEFAULT_LIST_LIMIT,
        ),
    };
    let entries = state.store.list().await?;

    Ok(Json(Envelope::paged(search(entries, &req))))
}

// ============ /api/entries/{id} ============

async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Envelope<KnowledgeEntry>>, ApiError> {
    match state.store.get(&id).await? {
        Some(entry) => Ok(Json(Envelope::ok(entry))),
        None => Err(not_found("Entry not found")),
    }
}

async fn handle_create(
    State(state): State<AppState>,
    payload: Result<Json<NewEntry>, JsonRejection>,
) -> Result<(StatusCode, Json<Envelope<KnowledgeEntry>>), ApiError> {
    let Json(payload) = payload?;
    let entry = payload.into_entry("api", Utc::now())?;
    state.store.put(entry.clone()).await?;
    tracing::info!(id = %entry.id, entry_type = %entry.entry_type, "entry created");

    Ok((StatusCode::CREATED, Json(Envelope::ok(entry))))
}

async fn handle_update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    patch: Result<Json<EntryPatch>, JsonRejection>,
) -> Result<Json<Envelope<KnowledgeEntry>>, ApiError> {
    let Json(patch) = patch?;
    let updated = state.store.update(&id, &patch).await?;
    tracing::info!(id = %updated.id, "entry updated");

    Ok(Json(Envelope::ok(updated)))
}

async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Envelope<()>>, ApiError> {
    state.store.delete(&id).await?;
    tracing::info!(id = %id, "entry deleted");

    Ok(Json(Envelope::empty()))
}

// ============ POST /api/ask ============

#[derive(Debug, Deserialize)]
struct AskRequest {
    #[serde(default)]
    question: Option<String>,
}

async fn handle_ask(
    State(state): State<AppState>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<Envelope<AskAnswer>>, ApiError> {
    let Json(payload) = payload?;
    let question = match payload.question {
        Some(q) if !q.is_empty() => q,
        _ => return Err(bad_request("Question is required")),
    };

    let entries = state.store.list().await?;
    Ok(Json(Envelope::ok(ask(&entries, &question))))
}

// ============ GET /api/stats ============

async fn handle_stats(
    State(state): State<AppState>,
) -> Result<Json<Envelope<KbStats>>, ApiError> {
    let entries = state.store.list().await?;
    let stats = compute_stats(&entries, state.history.count());

    Ok(Json(Envelope::ok(stats)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::{json, Value};

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn handle_boom() -> &'static str {
        panic!("boom")
    }

    #[tokio::test]
    async fn test_panic_renders_internal_error_envelope() {
        let response = handle_panic(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({"success": false, "error": "Internal server error"})
        );
    }

    #[tokio::test]
    async fn test_panicking_handler_is_caught() {
        let app = Router::new()
            .route("/boom", get(handle_boom))
            .layer(CatchPanicLayer::custom(handle_panic));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server_handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        let resp = reqwest::get(format!("http://{}/boom", addr)).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(
            body,
            json!({"success": false, "error": "Internal server error"})
        );

        server_handle.abort();
    }

    #[tokio::test]
    async fn test_not_found_error_envelope() {
        let response = ApiError::from(EntryError::NotFound("x".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await,
            json!({"success": false, "error": "Entry not found"})
        );
    }
}
