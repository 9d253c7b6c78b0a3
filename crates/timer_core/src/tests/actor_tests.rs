use std::time::Duration;

use tokio::sync::broadcast::{error::TryRecvError, Receiver};

use super::*;

fn drain(events: &mut Receiver<ShellEvent>) -> Vec<ShellEvent> {
    let mut seen = Vec::new();
    loop {
        match events.try_recv() {
            Ok(event) => seen.push(event),
            Err(TryRecvError::Lagged(_)) => continue,
            Err(TryRecvError::Empty | TryRecvError::Closed) => return seen,
        }
    }
}

async fn sleep_ms(millis: u64) {
    time::sleep(Duration::from_millis(millis)).await;
}

#[tokio::test(start_paused = true)]
async fn countdown_completes_once_and_rests_at_zero() {
    let (session, _task) = SessionHandle::spawn(TimerMode::Timer);
    let mut events = session.subscribe();

    session.configure(0, 90).await.expect("configure");
    let snapshot = session.snapshot().await.expect("snapshot");
    assert_eq!(snapshot.engine.display.to_string(), "00:01:30");

    session.start().await.expect("start");
    sleep_ms(91_000).await;

    let snapshot = session.snapshot().await.expect("snapshot");
    assert_eq!(snapshot.engine.status, EngineStatus::Idle);
    assert_eq!(snapshot.engine.display.to_string(), "00:00:00");
    assert!(!snapshot.controls_hidden);

    let completions: Vec<_> = drain(&mut events)
        .into_iter()
        .filter(|event| matches!(event, ShellEvent::Completed(_)))
        .collect();
    assert_eq!(
        completions,
        vec![ShellEvent::Completed(CompletionEvent { target_seconds: 90 })]
    );
}

#[tokio::test(start_paused = true)]
async fn zero_duration_start_is_rejected() {
    let (session, _task) = SessionHandle::spawn(TimerMode::Timer);
    let mut events = session.subscribe();

    let err = session.start().await.expect_err("should reject");
    assert!(matches!(
        err,
        ClientError::Engine(EngineError::InvalidDuration)
    ));
    assert!(drain(&mut events).contains(&ShellEvent::Rejected(EngineError::InvalidDuration)));
    let snapshot = session.snapshot().await.expect("snapshot");
    assert_eq!(snapshot.engine.status, EngineStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn stopwatch_advances_on_ten_millisecond_ticks() {
    let (session, _task) = SessionHandle::spawn(TimerMode::Stopwatch);

    session.start().await.expect("start");
    sleep_ms(1_245).await;
    session.pause().await.expect("pause");

    let snapshot = session.snapshot().await.expect("snapshot");
    assert_eq!(snapshot.engine.status, EngineStatus::Paused);
    assert_eq!(snapshot.engine.display.clock_text(), "00:00:01");
    assert!((1_230..=1_245).contains(&snapshot.engine.elapsed_millis));

    sleep_ms(10_000).await;
    let later = session.snapshot().await.expect("snapshot");
    assert_eq!(later.engine.elapsed_millis, snapshot.engine.elapsed_millis);
}

#[tokio::test(start_paused = true)]
async fn laps_are_reported_and_cleared_by_mode_switch() {
    let (session, _task) = SessionHandle::spawn(TimerMode::Stopwatch);
    let mut events = session.subscribe();

    session.start().await.expect("start");
    sleep_ms(505).await;
    session.lap().await.expect("lap");
    sleep_ms(500).await;
    session.lap().await.expect("lap");

    let snapshot = session.snapshot().await.expect("snapshot");
    assert_eq!(snapshot.engine.laps.len(), 2);
    let laps: Vec<_> = drain(&mut events)
        .into_iter()
        .filter_map(|event| match event {
            ShellEvent::LapRecorded { number, .. } => Some(number),
            _ => None,
        })
        .collect();
    assert_eq!(laps, vec![1, 2]);

    session
        .switch_mode(TimerMode::Stopwatch)
        .await
        .expect("switch");
    let snapshot = session.snapshot().await.expect("snapshot");
    assert!(snapshot.engine.laps.is_empty());
    assert_eq!(snapshot.engine.elapsed_millis, 0);
    assert_eq!(snapshot.engine.status, EngineStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn controls_hide_after_five_quiet_seconds() {
    let (session, _task) = SessionHandle::spawn(TimerMode::Timer);
    session.configure(10, 0).await.expect("configure");
    session.start().await.expect("start");

    sleep_ms(4_990).await;
    assert!(!session.snapshot().await.expect("snapshot").controls_hidden);
    sleep_ms(20).await;
    assert!(session.snapshot().await.expect("snapshot").controls_hidden);

    session.activity().await.expect("activity");
    assert!(!session.snapshot().await.expect("snapshot").controls_hidden);
    sleep_ms(4_990).await;
    assert!(!session.snapshot().await.expect("snapshot").controls_hidden);
    sleep_ms(20).await;
    assert!(session.snapshot().await.expect("snapshot").controls_hidden);

    session.pause().await.expect("pause");
    assert!(!session.snapshot().await.expect("snapshot").controls_hidden);
    sleep_ms(10_000).await;
    assert!(!session.snapshot().await.expect("snapshot").controls_hidden);
}

#[tokio::test(start_paused = true)]
async fn toggle_alternates_between_running_and_paused() {
    let (session, _task) = SessionHandle::spawn(TimerMode::Stopwatch);

    session.toggle().await.expect("start");
    assert_eq!(
        session.snapshot().await.expect("snapshot").engine.status,
        EngineStatus::Running
    );
    session.toggle().await.expect("pause");
    assert_eq!(
        session.snapshot().await.expect("snapshot").engine.status,
        EngineStatus::Paused
    );
}

#[tokio::test(start_paused = true)]
async fn configure_while_running_is_rejected() {
    let (session, _task) = SessionHandle::spawn(TimerMode::Timer);
    session.configure(1, 0).await.expect("configure");
    session.start().await.expect("start");

    let err = session.configure(2, 0).await.expect_err("should reject");
    assert!(matches!(
        err,
        ClientError::Engine(EngineError::ConfigureWhileRunning)
    ));
    assert_eq!(
        session.snapshot().await.expect("snapshot").engine.target_seconds,
        60
    );
}

#[tokio::test(start_paused = true)]
async fn stopwatch_refuses_configure_and_keeps_its_run() {
    let (session, _task) = SessionHandle::spawn(TimerMode::Stopwatch);
    let mut events = session.subscribe();

    session.start().await.expect("start");
    sleep_ms(1_505).await;
    session.lap().await.expect("lap");
    session.pause().await.expect("pause");
    let before = session.snapshot().await.expect("snapshot");

    let err = session.configure(5, 0).await.expect_err("should reject");
    assert!(matches!(
        err,
        ClientError::Engine(EngineError::ConfigureInStopwatch)
    ));
    assert!(drain(&mut events).contains(&ShellEvent::Rejected(EngineError::ConfigureInStopwatch)));

    let after = session.snapshot().await.expect("snapshot");
    assert_eq!(after, before);
    assert_eq!(after.engine.laps.len(), 1);
    assert_eq!(after.engine.status, EngineStatus::Paused);
}

#[tokio::test(start_paused = true)]
async fn second_start_keeps_a_single_tick_stream() {
    let (session, _task) = SessionHandle::spawn(TimerMode::Stopwatch);
    let mut events = session.subscribe();

    session.start().await.expect("start");
    sleep_ms(2_000).await;
    drain(&mut events);
    session.start().await.expect("second start");

    sleep_ms(1_000).await;
    let snapshot = session.snapshot().await.expect("snapshot");
    assert_eq!(snapshot.engine.status, EngineStatus::Running);
    assert!((2_990..=3_000).contains(&snapshot.engine.elapsed_millis));
    let displays = drain(&mut events)
        .into_iter()
        .filter(|event| matches!(event, ShellEvent::Display(_)))
        .count();
    assert!((99..=101).contains(&displays), "{displays} display updates");

    // The hide deadline still counts from the first start.
    sleep_ms(1_990).await;
    assert!(!session.snapshot().await.expect("snapshot").controls_hidden);
    sleep_ms(20).await;
    assert!(session.snapshot().await.expect("snapshot").controls_hidden);
}

#[tokio::test(start_paused = true)]
async fn session_draft_reflects_engine_state() {
    let (session, _task) = SessionHandle::spawn(TimerMode::Timer);
    assert!(matches!(
        session.session_draft().await,
        Err(ClientError::Engine(EngineError::NothingToSave(TimerMode::Timer)))
    ));

    session.configure(25, 0).await.expect("configure");
    let draft = session.session_draft().await.expect("draft");
    assert_eq!(draft.duration, "00:25:00");
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_the_loop() {
    let (session, task) = SessionHandle::spawn(TimerMode::Timer);
    session.shutdown().await.expect("shutdown");
    task.await.expect("join");

    assert!(matches!(
        session.snapshot().await,
        Err(ClientError::ActorStopped)
    ));
}
