use std::{collections::HashMap, path::Path};

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;
const SETTINGS_FILE: &str = "server.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub database_url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("DATABASE_URL is not set; the session store has no connection string")]
    MissingDatabaseUrl,
    #[error("invalid server configuration: {0}")]
    Invalid(#[from] ConfigError),
}

#[derive(Debug, Deserialize)]
struct RawSettings {
    host: String,
    port: u16,
    database_url: Option<String>,
}

/// Reads `server.toml` (if present) and the process environment.
pub fn load_settings() -> Result<Settings, SettingsError> {
    settings_from(Some(Path::new(SETTINGS_FILE)), std::env::vars().collect())
}

/// Layers defaults, the optional settings file, `APP__*` variables and finally
/// the plain `HOST`, `PORT` and `DATABASE_URL` variables.
pub fn settings_from(
    file: Option<&Path>,
    vars: HashMap<String, String>,
) -> Result<Settings, SettingsError> {
    let mut builder = Config::builder()
        .set_default("host", DEFAULT_HOST)?
        .set_default("port", i64::from(DEFAULT_PORT))?;
    if let Some(path) = file {
        builder = builder.add_source(File::from(path).required(false));
    }
    let raw: RawSettings = builder
        .add_source(
            Environment::with_prefix("APP")
                .separator("__")
                .try_parsing(true)
                .source(Some(vars.clone())),
        )
        .set_override_option("host", vars.get("HOST").cloned())?
        .set_override_option("port", vars.get("PORT").cloned())?
        .set_override_option("database_url", vars.get("DATABASE_URL").cloned())?
        .build()?
        .try_deserialize()?;

    let database_url = raw
        .database_url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(normalize_database_url)
        .ok_or(SettingsError::MissingDatabaseUrl)?;

    Ok(Settings {
        host: raw.host,
        port: raw.port,
        database_url,
    })
}

/// Turns bare file paths into `sqlite:` URLs; anything with a scheme is kept.
fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.starts_with("sqlite:") || raw_database_url.contains("://") {
        return raw_database_url.to_string();
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
