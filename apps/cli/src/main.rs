use std::io::Write as _;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shared::{
    domain::{SessionId, TimerMode},
    protocol::SessionRecord,
};
use timer_core::{
    preset_from_record, ClientError, EngineError, SessionClient, SessionHandle, ShellEvent,
};
use tokio::{
    io::{self, AsyncBufReadExt, BufReader},
    sync::broadcast::{error::RecvError, Receiver},
};
use tracing::{debug, warn};

mod keys;

use keys::{other_mode, parse_key, KeyAction, KEY_HELP};

#[derive(Parser, Debug)]
#[command(name = "focus", about = "Countdown timer and stopwatch")]
struct Cli {
    #[arg(long, global = true, default_value = "http://127.0.0.1:3000")]
    server: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run an interactive timer or stopwatch.
    Run {
        #[arg(long, default_value = "timer")]
        mode: TimerMode,
        #[arg(long)]
        minutes: Option<u32>,
        #[arg(long)]
        seconds: Option<u32>,
        /// Also save the session to the server on quit.
        #[arg(long)]
        save: bool,
    },
    /// Show the most recently saved timer.
    Last,
    /// List saved sessions, newest first.
    History,
    /// Delete a saved session.
    Delete { id: i64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();
    let client = SessionClient::new(&cli.server)
        .with_context(|| format!("invalid server url '{}'", cli.server))?;

    match cli.command {
        Command::Run {
            mode,
            minutes,
            seconds,
            save,
        } => run(&client, mode, minutes, seconds, save).await?,
        Command::Last => match client.last_timer().await? {
            Some(record) => println!(
                "Last timer: {} (saved {})",
                record.duration,
                record.created_at.format("%Y-%m-%d %H:%M:%S UTC")
            ),
            None => println!("No timer sessions saved yet."),
        },
        Command::History => {
            let sessions = client.recent_sessions().await?;
            if sessions.is_empty() {
                println!("No sessions saved yet.");
            }
            for session in &sessions {
                print_session(session);
            }
        }
        Command::Delete { id } => {
            client.delete_session(SessionId(id)).await?;
            println!("Deleted session {id}");
        }
    }

    Ok(())
}

async fn run(
    client: &SessionClient,
    mode: TimerMode,
    minutes: Option<u32>,
    seconds: Option<u32>,
    save: bool,
) -> Result<()> {
    // The preset is applied in timer mode; it survives a switch to the stopwatch.
    let (session, task) = SessionHandle::spawn(TimerMode::Timer);
    let printer = tokio::spawn(print_events(session.subscribe()));
    if let Some((minutes, seconds)) = initial_preset(client, minutes, seconds).await {
        session.configure(minutes, seconds).await?;
    }
    if mode != TimerMode::Timer {
        session.switch_mode(mode).await?;
    }
    println!("{KEY_HELP}");

    let mut lines = BufReader::new(io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else { break };

        session.activity().await?;
        let Some(action) = parse_key(&line) else {
            println!("{KEY_HELP}");
            continue;
        };
        match action {
            KeyAction::Toggle => accept_rejection(session.toggle().await)?,
            KeyAction::Reset => session.reset().await?,
            KeyAction::Lap => session.lap().await?,
            KeyAction::SwitchMode => {
                let current = session.snapshot().await?.engine.mode;
                session.switch_mode(other_mode(current)).await?;
            }
            KeyAction::Configure { minutes, seconds } => {
                accept_rejection(session.configure(minutes, seconds).await)?
            }
            KeyAction::Save => save_current(client, &session).await?,
            KeyAction::Quit => break,
        }
    }

    if save {
        save_current(client, &session).await?;
    }
    session.shutdown().await?;
    task.await.context("timer session task failed")?;
    printer.abort();
    println!();
    Ok(())
}

/// Explicit flags win; otherwise the last saved timer is loaded.
async fn initial_preset(
    client: &SessionClient,
    minutes: Option<u32>,
    seconds: Option<u32>,
) -> Option<(u32, u32)> {
    if minutes.is_some() || seconds.is_some() {
        return Some((minutes.unwrap_or(0), seconds.unwrap_or(0)));
    }
    match client.last_timer().await {
        Ok(last) => last.as_ref().and_then(preset_from_record),
        Err(err) => {
            warn!(error = %err, "could not load last timer");
            None
        }
    }
}

async fn save_current(client: &SessionClient, session: &SessionHandle) -> Result<()> {
    let draft = match session.session_draft().await {
        Ok(draft) => draft,
        Err(ClientError::Engine(EngineError::NothingToSave(mode))) => {
            println!("\nNothing to save for this {mode}.");
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };
    match client.save_session(&draft).await {
        Ok(saved) => println!("\nSaved session {} ({})", saved.id.0, saved.duration),
        Err(err) => println!("\nCould not save session: {err}"),
    }
    Ok(())
}

/// Rejections are already reported through the event stream.
fn accept_rejection(result: Result<(), ClientError>) -> Result<(), ClientError> {
    match result {
        Err(ClientError::Engine(err)) => {
            debug!(%err, "command rejected");
            Ok(())
        }
        other => other,
    }
}

async fn print_events(mut events: Receiver<ShellEvent>) {
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                debug!(skipped, "display fell behind");
                continue;
            }
            Err(RecvError::Closed) => break,
        };
        match event {
            ShellEvent::Display(display) => print!("\r{display}    "),
            ShellEvent::LapRecorded { number, time } => println!("\nLap {number}: {time}"),
            ShellEvent::Completed(_) => println!("\x07\nTime's up!"),
            ShellEvent::ModeChanged(mode) => println!("\nMode: {mode}"),
            ShellEvent::ControlsShown => println!("\n{KEY_HELP}"),
            ShellEvent::Rejected(err) => println!("\n{err}"),
            ShellEvent::StatusChanged(_) | ShellEvent::ControlsHidden => {}
        }
        let _ = std::io::stdout().flush();
    }
}

fn print_session(session: &SessionRecord) {
    println!(
        "#{:<5} {:<9} {}  {}",
        session.id.0,
        session.kind.as_str(),
        session.duration,
        session.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    for (index, lap) in session.laps.iter().enumerate() {
        println!("       lap {}: {lap}", index + 1);
    }
}
