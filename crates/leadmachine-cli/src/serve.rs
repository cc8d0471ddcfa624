//! `leadmachine serve`: webhook ingestion and admin endpoints over HTTP.
//!
//! Endpoints:
//! - GET  /health            - Server status
//! - POST /conversations     - Ingest one conversation (webhook delivery)
//! - POST /admin/fix-names   - Run the correction pass (`?dry_run=true` to preview)
//!
//! The store sits behind a mutex; every store call runs on the blocking pool.

use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::FixedOffset;
use leadmachine_core::Conversation;
use leadmachine_ingest::{CorrectionMode, Reconciler};
use leadmachine_store::LeadStore;
use serde::Deserialize;
use tracing::{info, warn};

/// State shared across request handlers.
pub(crate) struct AppState<S> {
    store: Mutex<S>,
    offset: FixedOffset,
}

impl<S> AppState<S> {
    pub(crate) fn new(store: S, offset: FixedOffset) -> Self {
        Self {
            store: Mutex::new(store),
            offset,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct FixNamesParams {
    #[serde(default)]
    dry_run: bool,
}

fn json_error(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({"error": message}))).into_response()
}

/// Bind `0.0.0.0:{port}` and serve until Ctrl+C.
pub async fn start_server<S>(store: S, offset: FixedOffset, port: u16) -> anyhow::Result<()>
where
    S: LeadStore + Send + 'static,
{
    let state = Arc::new(AppState::new(store, offset));
    let app = router(state);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "leadmachine listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server shut down");
    Ok(())
}

fn router<S>(state: Arc<AppState<S>>) -> Router
where
    S: LeadStore + Send + 'static,
{
    Router::new()
        .route("/health", get(handle_health))
        .route("/conversations", post(handle_ingest::<S>))
        .route("/admin/fix-names", post(handle_fix_names::<S>))
        .fallback(handle_not_found)
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    info!("received shutdown signal");
}

/// Run `f` against a reconciler over the locked store, off the async runtime.
async fn with_reconciler<S, T, F>(state: Arc<AppState<S>>, f: F) -> Result<T, String>
where
    S: LeadStore + Send + 'static,
    T: Send + 'static,
    F: FnOnce(&Reconciler<&S>) -> T + Send + 'static,
{
    tokio::task::spawn_blocking(move || -> Result<T, String> {
        let guard = state
            .store
            .lock()
            .map_err(|_| "store mutex poisoned".to_string())?;
        let reconciler = Reconciler::new(&*guard, state.offset);
        Ok(f(&reconciler))
    })
    .await
    .map_err(|e| format!("store task failed: {e}"))?
}

// ── Handlers ──

async fn handle_not_found() -> Response {
    json_error(StatusCode::NOT_FOUND, "not found")
}

/// GET /health
async fn handle_health() -> Response {
    let response = serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    });
    (StatusCode::OK, Json(response)).into_response()
}

/// POST /conversations
///
/// 201 when a lead was created, 200 when the conversation was already known.
async fn handle_ingest<S>(
    State(state): State<Arc<AppState<S>>>,
    Json(conv): Json<Conversation>,
) -> Response
where
    S: LeadStore + Send + 'static,
{
    let conversation_id = conv.conversation_id.clone();
    match with_reconciler(state, move |r| r.ingest(&conv)).await {
        Ok(Ok(outcome)) => {
            let status = if outcome.is_created() {
                StatusCode::CREATED
            } else {
                StatusCode::OK
            };
            let body = serde_json::json!({
                "id": outcome.id(),
                "created": outcome.is_created(),
            });
            (status, Json(body)).into_response()
        }
        Ok(Err(e)) => {
            warn!(conversation_id = %conversation_id, error = %e, "webhook ingest failed");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
        Err(msg) => json_error(StatusCode::INTERNAL_SERVER_ERROR, &msg),
    }
}

/// POST /admin/fix-names
async fn handle_fix_names<S>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<FixNamesParams>,
) -> Response
where
    S: LeadStore + Send + 'static,
{
    let mode = if params.dry_run {
        CorrectionMode::DryRun
    } else {
        CorrectionMode::Apply
    };
    match with_reconciler(state, move |r| r.correct_names(mode)).await {
        Ok(Ok(report)) => {
            info!(mode = %mode, summary = %report.summary(), "correction pass via admin endpoint");
            (StatusCode::OK, Json(report)).into_response()
        }
        Ok(Err(e)) => {
            warn!(error = %e, "correction pass aborted");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
        Err(msg) => json_error(StatusCode::INTERNAL_SERVER_ERROR, &msg),
    }
}
