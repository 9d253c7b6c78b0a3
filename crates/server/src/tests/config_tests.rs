use super::*;

use std::{
    env, fs,
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};

fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

fn temp_root(label: &str) -> PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    env::temp_dir().join(format!("focus_server_{label}_{suffix}"))
}

#[test]
fn missing_database_url_fails_fast() {
    let err = settings_from(None, vars(&[])).expect_err("should fail");
    assert!(matches!(err, SettingsError::MissingDatabaseUrl));

    let err = settings_from(None, vars(&[("DATABASE_URL", "  ")])).expect_err("should fail");
    assert!(matches!(err, SettingsError::MissingDatabaseUrl));
}

#[test]
fn defaults_apply_when_only_database_url_is_set() {
    let settings =
        settings_from(None, vars(&[("DATABASE_URL", "sqlite::memory:")])).expect("settings");
    assert_eq!(
        settings,
        Settings {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            database_url: "sqlite::memory:".to_string(),
        }
    );
}

#[test]
fn plain_port_variable_wins_over_prefixed_one() {
    let settings = settings_from(
        None,
        vars(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("APP__PORT", "4000"),
            ("PORT", "8080"),
        ]),
    )
    .expect("settings");
    assert_eq!(settings.port, 8080);
}

#[test]
fn prefixed_variables_feed_settings() {
    let settings = settings_from(
        None,
        vars(&[
            ("APP__DATABASE_URL", "sqlite://./data/focus.db"),
            ("APP__HOST", "0.0.0.0"),
            ("APP__PORT", "4000"),
        ]),
    )
    .expect("settings");
    assert_eq!(settings.host, "0.0.0.0");
    assert_eq!(settings.port, 4000);
    assert_eq!(settings.database_url, "sqlite://./data/focus.db");
}

#[test]
fn invalid_port_is_reported() {
    let err = settings_from(
        None,
        vars(&[("DATABASE_URL", "sqlite::memory:"), ("PORT", "not-a-port")]),
    )
    .expect_err("should fail");
    assert!(matches!(err, SettingsError::Invalid(_)));
}

#[test]
fn settings_file_is_layered_under_environment() {
    let root = temp_root("file");
    fs::create_dir_all(&root).expect("temp root");
    let path = root.join("server.toml");
    fs::write(
        &path,
        "host = \"0.0.0.0\"\nport = 5000\ndatabase_url = \"./data/from-file.db\"\n",
    )
    .expect("write settings");

    let from_file = settings_from(Some(&path), vars(&[])).expect("settings");
    assert_eq!(from_file.host, "0.0.0.0");
    assert_eq!(from_file.port, 5000);
    assert_eq!(from_file.database_url, "sqlite://./data/from-file.db");

    let overridden = settings_from(Some(&path), vars(&[("PORT", "6000")])).expect("settings");
    assert_eq!(overridden.port, 6000);
    assert_eq!(overridden.host, "0.0.0.0");

    fs::remove_dir_all(root).expect("cleanup");
}

#[test]
fn missing_settings_file_is_ignored() {
    let path = temp_root("absent").join("server.toml");
    let settings = settings_from(Some(&path), vars(&[("DATABASE_URL", "sqlite::memory:")]))
        .expect("settings");
    assert_eq!(settings.port, DEFAULT_PORT);
}

#[test]
fn normalizes_plain_file_path_to_sqlite_url() {
    assert_eq!(
        normalize_database_url("./data/test.db"),
        "sqlite://./data/test.db"
    );
    assert_eq!(
        normalize_database_url("sqlite://./data/test.db"),
        "sqlite://./data/test.db"
    );
    assert_eq!(normalize_database_url("sqlite::memory:"), "sqlite::memory:");
}

#[tokio::test]
async fn normalized_path_opens_a_sqlite_file() {
    let root = temp_root("open");
    let db_path = root.join("nested").join("focus.db");

    let url = normalize_database_url(db_path.to_string_lossy().as_ref());
    let storage = storage::Storage::new(&url).await.expect("open sqlite");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should be created: {}",
        db_path.display()
    );

    fs::remove_dir_all(root).expect("cleanup");
}
