use shared::domain::TimerMode;
use storage::Storage;

#[tokio::test]
async fn sessions_survive_reopening_the_database_file() {
    let suffix = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let temp_root = std::env::temp_dir().join(format!("focus_timer_reopen_test_{suffix}"));
    let db_path = temp_root.join("sessions.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let saved = {
        let storage = Storage::new(&database_url).await.expect("open");
        let saved = storage
            .insert_session(
                TimerMode::Stopwatch,
                "00:01:02",
                &["00:00:30.500".to_string()],
            )
            .await
            .expect("insert");
        storage.pool().close().await;
        saved
    };

    let reopened = Storage::new(&database_url).await.expect("reopen");
    let listed = reopened.recent_sessions(50).await.expect("list");
    assert_eq!(listed, vec![saved]);

    reopened.pool().close().await;
    std::fs::remove_dir_all(temp_root).expect("cleanup");
}
