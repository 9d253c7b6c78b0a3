use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{SessionId, TimerMode};

pub const LAST_TIMER_ROUTE: &str = "/api/last-timer";
pub const SAVE_SESSION_ROUTE: &str = "/api/save-session";
pub const SESSIONS_ROUTE: &str = "/api/sessions";
pub const HISTORY_LIMIT: u32 = 50;

pub fn session_route(session_id: SessionId) -> String {
    format!("/api/session/{}", session_id.0)
}

/// A persisted timer or stopwatch run. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: SessionId,
    #[serde(rename = "type")]
    pub kind: TimerMode,
    pub duration: String,
    #[serde(default)]
    pub laps: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveSessionRequest {
    #[serde(rename = "type")]
    pub kind: TimerMode,
    pub duration: String,
    #[serde(default)]
    pub laps: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveSessionResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastTimerResponse {
    pub last_timer: Option<SessionRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteSessionResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
