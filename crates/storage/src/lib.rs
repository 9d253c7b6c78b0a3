use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use shared::{
    domain::{SessionId, TimerMode},
    protocol::SessionRecord,
};

const MEMORY_DATABASE_URL: &str = "sqlite::memory:";

/// Append-only store of finished timer and stopwatch sessions.
#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // Every connection to an in-memory database sees its own empty schema.
        let pool_options = if database_url.starts_with(MEMORY_DATABASE_URL) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = pool_options.connect_with(connect_options).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn insert_session(
        &self,
        kind: TimerMode,
        duration: &str,
        laps: &[String],
    ) -> Result<SessionRecord> {
        let laps_json = serde_json::to_string(laps).context("failed to encode laps")?;
        let created_at = Utc::now();
        let row = sqlx::query(
            "INSERT INTO sessions (kind, duration, laps, created_at) VALUES (?, ?, ?, ?) RETURNING id",
        )
        .bind(kind.as_str())
        .bind(duration)
        .bind(laps_json)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await
        .context("failed to insert session")?;

        Ok(SessionRecord {
            id: SessionId(row.get::<i64, _>(0)),
            kind,
            duration: duration.to_string(),
            laps: laps.to_vec(),
            created_at,
        })
    }

    pub async fn latest_session(&self, kind: TimerMode) -> Result<Option<SessionRecord>> {
        let row = sqlx::query(
            "SELECT id, kind, duration, laps, created_at
             FROM sessions
             WHERE kind = ?
             ORDER BY created_at DESC, id DESC
             LIMIT 1",
        )
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await
        .context("failed to load latest session")?;

        row.as_ref().map(session_from_row).transpose()
    }

    /// Most recent sessions first.
    pub async fn recent_sessions(&self, limit: u32) -> Result<Vec<SessionRecord>> {
        let rows = sqlx::query(
            "SELECT id, kind, duration, laps, created_at
             FROM sessions
             ORDER BY created_at DESC, id DESC
             LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("failed to list sessions")?;

        rows.iter().map(session_from_row).collect()
    }

    /// Returns whether a row was removed.
    pub async fn delete_session(&self, session_id: SessionId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(session_id.0)
            .execute(&self.pool)
            .await
            .context("failed to delete session")?;
        Ok(result.rows_affected() > 0)
    }
}

fn session_from_row(row: &SqliteRow) -> Result<SessionRecord> {
    let id = SessionId(row.try_get::<i64, _>("id")?);
    let kind_text: String = row.try_get("kind")?;
    let kind = TimerMode::from_str(&kind_text)
        .map_err(|err| anyhow!("session {} has corrupt kind: {err}", id.0))?;
    let laps_json: String = row.try_get("laps")?;
    let laps: Vec<String> = serde_json::from_str(&laps_json)
        .with_context(|| format!("session {} has corrupt laps", id.0))?;

    Ok(SessionRecord {
        id,
        kind,
        duration: row.try_get("duration")?,
        laps,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with(MEMORY_DATABASE_URL) || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
