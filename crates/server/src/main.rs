use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::json;
use server_api::{
    delete_session, last_timer, recent_sessions, save_session, store_ready, ApiContext,
};
use shared::{
    domain::SessionId,
    error::{ApiError, ErrorCode},
    protocol::{
        DeleteSessionResponse, LastTimerResponse, SaveSessionRequest, SaveSessionResponse,
        SessionRecord, LAST_TIMER_ROUTE, SAVE_SESSION_ROUTE, SESSIONS_ROUTE,
    },
};
use storage::Storage;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{error, info, warn};

mod config;
mod pages;

use config::load_settings;

const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

#[derive(Clone)]
struct AppState {
    api: ApiContext,
}

type ApiFailure = (StatusCode, Json<serde_json::Value>);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = load_settings().context("failed to load server settings")?;
    let database_url = settings.database_url.clone();
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite session store; verify the path and its permissions"
        );
        error
    })?;
    info!(%database_url, "session store ready");

    let app = build_router(Arc::new(AppState {
        api: ApiContext { storage },
    }));

    let listener = tokio::net::TcpListener::bind((settings.host.as_str(), settings.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", settings.host, settings.port))?;
    let addr = listener.local_addr()?;
    info!(%addr, "focus timer server listening");
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_page))
        .route("/history", get(history_page))
        .route("/healthz", get(healthz))
        .route(LAST_TIMER_ROUTE, get(http_last_timer))
        .route(SAVE_SESSION_ROUTE, post(http_save_session))
        .route("/api/session/:id", delete(http_delete_session))
        .route(SESSIONS_ROUTE, get(http_recent_sessions))
        .fallback(not_found)
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index_page(State(state): State<Arc<AppState>>) -> Html<String> {
    let last = match last_timer(&state.api).await {
        Ok(last) => last,
        Err(err) => {
            warn!(error = %err.message, "rendering timer page without last timer");
            None
        }
    };
    Html(pages::render_index(last.as_ref()))
}

async fn history_page(State(state): State<Arc<AppState>>) -> Response {
    match recent_sessions(&state.api).await {
        Ok(sessions) => Html(pages::render_history(&sessions)).into_response(),
        Err(err) => {
            error!(error = %err.message, "failed to load history");
            (StatusCode::INTERNAL_SERVER_ERROR, "Error loading history").into_response()
        }
    }
}

async fn healthz(State(state): State<Arc<AppState>>) -> Result<&'static str, StatusCode> {
    store_ready(&state.api).await.map_err(|err| {
        warn!(error = %err.message, "health check failed");
        StatusCode::SERVICE_UNAVAILABLE
    })?;
    Ok("ok")
}

async fn http_last_timer(
    State(state): State<Arc<AppState>>,
) -> Result<Json<LastTimerResponse>, ApiFailure> {
    let last_timer = last_timer(&state.api).await.map_err(api_failure)?;
    Ok(Json(LastTimerResponse { last_timer }))
}

async fn http_save_session(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SaveSessionRequest>, JsonRejection>,
) -> Result<Json<SaveSessionResponse>, ApiFailure> {
    let Json(req) = payload.map_err(|rejection| {
        rejected(rejection.status(), rejection.body_text())
    })?;
    let session = save_session(&state.api, req).await.map_err(api_failure)?;
    Ok(Json(SaveSessionResponse {
        success: true,
        session: Some(session),
        error: None,
    }))
}

async fn http_delete_session(
    State(state): State<Arc<AppState>>,
    session_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<DeleteSessionResponse>, ApiFailure> {
    let Path(session_id) = session_id.map_err(|rejection| {
        rejected(rejection.status(), rejection.body_text())
    })?;
    delete_session(&state.api, SessionId(session_id))
        .await
        .map_err(api_failure)?;
    Ok(Json(DeleteSessionResponse {
        success: true,
        error: None,
    }))
}

async fn http_recent_sessions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<SessionRecord>>, ApiFailure> {
    let sessions = recent_sessions(&state.api).await.map_err(api_failure)?;
    Ok(Json(sessions))
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Page not found")
}

fn api_failure(err: ApiError) -> ApiFailure {
    let status = match err.code {
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Persistence => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error!(code = ?err.code, error = %err.message, "api request failed");
    failure_envelope(status, err.message)
}

/// Malformed requests get the same envelope as store failures.
fn rejected(status: StatusCode, message: String) -> ApiFailure {
    warn!(%status, error = %message, "request rejected");
    failure_envelope(status, message)
}

fn failure_envelope(status: StatusCode, message: String) -> ApiFailure {
    (status, Json(json!({ "success": false, "error": message })))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
