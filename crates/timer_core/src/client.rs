use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::SessionId,
    duration::parse_preset,
    protocol::{
        session_route, DeleteSessionResponse, LastTimerResponse, SaveSessionRequest,
        SaveSessionResponse, SessionRecord, LAST_TIMER_ROUTE, SAVE_SESSION_ROUTE, SESSIONS_ROUTE,
    },
};
use tracing::debug;
use url::Url;

use crate::error::ClientError;

/// HTTP client for the session endpoints of the focus timer server.
#[derive(Clone)]
pub struct SessionClient {
    http: Client,
    base_url: Url,
}

impl SessionClient {
    /// `server_url` may carry a path prefix such as `http://host/focus`.
    pub fn new(server_url: &str) -> Result<Self, ClientError> {
        let mut base_url = Url::parse(server_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            http: Client::new(),
            base_url,
        })
    }

    pub async fn last_timer(&self) -> Result<Option<SessionRecord>, ClientError> {
        let response = self.http.get(self.endpoint(LAST_TIMER_ROUTE)?).send().await?;
        let body: LastTimerResponse = read_json(response).await?;
        Ok(body.last_timer)
    }

    pub async fn save_session(
        &self,
        draft: &SaveSessionRequest,
    ) -> Result<SessionRecord, ClientError> {
        let response = self
            .http
            .post(self.endpoint(SAVE_SESSION_ROUTE)?)
            .json(draft)
            .send()
            .await?;
        let body: SaveSessionResponse = read_json(response).await?;
        match (body.success, body.session) {
            (true, Some(session)) => {
                debug!(session_id = session.id.0, "session saved");
                Ok(session)
            }
            _ => Err(ClientError::Persistence(
                body.error
                    .unwrap_or_else(|| "server did not return the saved session".to_string()),
            )),
        }
    }

    pub async fn delete_session(&self, session_id: SessionId) -> Result<(), ClientError> {
        let response = self
            .http
            .delete(self.endpoint(&session_route(session_id))?)
            .send()
            .await?;
        let body: DeleteSessionResponse = read_json(response).await?;
        if !body.success {
            return Err(ClientError::Persistence(
                body.error
                    .unwrap_or_else(|| format!("failed to delete session {}", session_id.0)),
            ));
        }
        Ok(())
    }

    pub async fn recent_sessions(&self) -> Result<Vec<SessionRecord>, ClientError> {
        let response = self.http.get(self.endpoint(SESSIONS_ROUTE)?).send().await?;
        read_json(response).await
    }

    /// Routes are joined relative to the base so its path prefix is kept.
    fn endpoint(&self, route: &str) -> Result<Url, ClientError> {
        Ok(self.base_url.join(route.trim_start_matches('/'))?)
    }
}

/// `(minutes, seconds)` to preload into the timer from a saved session.
pub fn preset_from_record(record: &SessionRecord) -> Option<(u32, u32)> {
    parse_preset(&record.duration)
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|value| value.get("error")?.as_str().map(str::to_owned))
            .unwrap_or(body);
        return Err(ClientError::Persistence(format!("{status}: {message}")));
    }
    Ok(response.json().await?)
}

#[cfg(test)]
#[path = "tests/client_tests.rs"]
mod tests;
