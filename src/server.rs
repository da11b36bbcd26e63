//! Read-only HTTP API.
//!
//! Serves the ingested corpus to presentation layers: catalog listings,
//! per-title metrics and history, raw snapshot text, and the aggregated
//! agency hierarchy. Nothing here writes; ingestion happens only through
//! the `regs ingest` command.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/api/agencies` | List agencies |
//! | `GET` | `/api/titles` | List titles |
//! | `GET` | `/api/titles/{number}/metrics` | Latest-run aggregate for a title |
//! | `GET` | `/api/titles/{number}/history` | Full snapshot history for a title |
//! | `GET` | `/api/titles/{number}/raw` | Raw text of the latest snapshot set |
//! | `GET` | `/api/agencies/metrics` | Per-agency aggregates with nested detail |
//! | `GET` | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "not_found", "message": "title not found: 99" } }
//! ```
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so browser dashboards
//! can consume the API directly.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use sqlx::Row;
use tower_http::cors::{Any, CorsLayer};

use crate::aggregate;
use crate::config::Config;
use crate::db;
use crate::models::{Agency, Snapshot, Title};
use crate::report::lookup_title_id;
use crate::store;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    pool: sqlx::SqlitePool,
    aggregate: crate::config::AggregateConfig,
}

/// Starts the read-only HTTP server.
///
/// Binds to the address configured in `[server].bind` and runs until the
/// process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let pool = db::connect(config).await?;
    let state = AppState {
        pool,
        aggregate: config.aggregate.clone(),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/api/agencies", get(handle_agencies))
        .route("/api/agencies/metrics", get(handle_agency_metrics))
        .route("/api/titles", get(handle_titles))
        .route("/api/titles/{number}/metrics", get(handle_title_metrics))
        .route("/api/titles/{number}/history", get(handle_title_history))
        .route("/api/titles/{number}/raw", get(handle_title_raw))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state);

    let bind_addr = &config.server.bind;
    println!("API server listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        internal(e.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        internal(e.to_string())
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /api/agencies ============

async fn handle_agencies(State(state): State<AppState>) -> Result<Json<Vec<Agency>>, AppError> {
    let rows = sqlx::query(
        "SELECT id, name, short_name, slug, parent_id FROM agencies ORDER BY name ASC",
    )
    .fetch_all(&state.pool)
    .await?;

    let agencies = rows
        .iter()
        .map(|row| Agency {
            id: row.get("id"),
            name: row.get("name"),
            short_name: row.get("short_name"),
            slug: row.get("slug"),
            parent_id: row.get("parent_id"),
        })
        .collect();
    Ok(Json(agencies))
}

// ============ GET /api/titles ============

async fn handle_titles(State(state): State<AppState>) -> Result<Json<Vec<Title>>, AppError> {
    let rows = sqlx::query(
        r#"
        SELECT id, number, name, latest_amended_on, latest_issue_date, up_to_date_as_of, reserved
        FROM titles ORDER BY number ASC
        "#,
    )
    .fetch_all(&state.pool)
    .await?;

    let titles = rows
        .iter()
        .map(|row| Title {
            id: row.get("id"),
            number: row.get("number"),
            name: row.get("name"),
            latest_amended_on: row.get("latest_amended_on"),
            latest_issue_date: row.get("latest_issue_date"),
            up_to_date_as_of: row.get("up_to_date_as_of"),
            reserved: row.get::<i64, _>("reserved") != 0,
        })
        .collect();
    Ok(Json(titles))
}

// ============ GET /api/titles/{number}/metrics ============

async fn handle_title_metrics(
    State(state): State<AppState>,
    Path(number): Path<i64>,
) -> Result<Json<aggregate::TitleAggregate>, AppError> {
    let aggregate = aggregate::title_aggregate_by_number(&state.pool, number)
        .await?
        .ok_or_else(|| not_found(format!("no snapshot found for title {}", number)))?;
    Ok(Json(aggregate))
}

// ============ GET /api/titles/{number}/history ============

/// One history entry; raw text is omitted to keep the payload small.
#[derive(Serialize)]
struct HistoryEntry {
    retrieved_at: String,
    word_count: i64,
    sentence_count: i64,
    avg_sentence_length: f64,
    lexical_density: f64,
    checksum: String,
}

impl From<&Snapshot> for HistoryEntry {
    fn from(s: &Snapshot) -> Self {
        HistoryEntry {
            retrieved_at: s.retrieved_at.clone(),
            word_count: s.word_count,
            sentence_count: s.sentence_count,
            avg_sentence_length: s.avg_sentence_length,
            lexical_density: s.lexical_density,
            checksum: s.checksum.clone(),
        }
    }
}

async fn handle_title_history(
    State(state): State<AppState>,
    Path(number): Path<i64>,
) -> Result<Json<Vec<HistoryEntry>>, AppError> {
    let title_id = lookup_title_id(&state.pool, number)
        .await?
        .ok_or_else(|| not_found(format!("title not found: {}", number)))?;

    let history = store::history(&state.pool, title_id).await?;
    Ok(Json(history.iter().map(HistoryEntry::from).collect()))
}

// ============ GET /api/titles/{number}/raw ============

async fn handle_title_raw(
    State(state): State<AppState>,
    Path(number): Path<i64>,
) -> Result<Response, AppError> {
    let title_id = lookup_title_id(&state.pool, number)
        .await?
        .ok_or_else(|| not_found(format!("title not found: {}", number)))?;

    let text = store::latest_raw_text(&state.pool, title_id)
        .await?
        .ok_or_else(|| not_found(format!("no snapshot found for title {}", number)))?;

    Ok(([("content-type", "text/plain; charset=utf-8")], text).into_response())
}

// ============ GET /api/agencies/metrics ============

async fn handle_agency_metrics(
    State(state): State<AppState>,
) -> Result<Json<Vec<aggregate::AgencyAggregate>>, AppError> {
    let roots = aggregate::agency_metrics(&state.pool, &state.aggregate).await?;
    Ok(Json(roots))
}
