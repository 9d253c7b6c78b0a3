use shared::{
    domain::{SessionId, TimerMode},
    error::ApiError,
    protocol::{SaveSessionRequest, SessionRecord, HISTORY_LIMIT},
};
use storage::Storage;
use tracing::{debug, info};

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
}

/// Persists a finished run. Timer runs never carry laps.
pub async fn save_session(
    ctx: &ApiContext,
    request: SaveSessionRequest,
) -> Result<SessionRecord, ApiError> {
    if request.duration.trim().is_empty() {
        return Err(ApiError::validation("duration is required"));
    }
    let laps = match request.kind {
        TimerMode::Timer => Vec::new(),
        TimerMode::Stopwatch => request.laps,
    };
    let record = ctx
        .storage
        .insert_session(request.kind, &request.duration, &laps)
        .await
        .map_err(persistence)?;
    info!(
        session_id = record.id.0,
        kind = %record.kind,
        duration = %record.duration,
        laps = record.laps.len(),
        "session saved"
    );
    Ok(record)
}

pub async fn last_timer(ctx: &ApiContext) -> Result<Option<SessionRecord>, ApiError> {
    ctx.storage
        .latest_session(TimerMode::Timer)
        .await
        .map_err(persistence)
}

pub async fn recent_sessions(ctx: &ApiContext) -> Result<Vec<SessionRecord>, ApiError> {
    ctx.storage
        .recent_sessions(HISTORY_LIMIT)
        .await
        .map_err(persistence)
}

/// Deleting an id that is already gone is not an error.
pub async fn delete_session(ctx: &ApiContext, session_id: SessionId) -> Result<(), ApiError> {
    let removed = ctx
        .storage
        .delete_session(session_id)
        .await
        .map_err(persistence)?;
    if removed {
        info!(session_id = session_id.0, "session deleted");
    } else {
        debug!(session_id = session_id.0, "delete requested for unknown session");
    }
    Ok(())
}

pub async fn store_ready(ctx: &ApiContext) -> Result<(), ApiError> {
    ctx.storage.health_check().await.map_err(persistence)
}

fn persistence(err: anyhow::Error) -> ApiError {
    ApiError::persistence(format!("{err:#}"))
}
