//! Single event loop that owns one engine and one auto-hide controller.
//!
//! User intents, engine ticks and hide timeouts are all handled on this one
//! task, so the engine state is never touched concurrently. Shells talk to it
//! through a cloneable [`SessionHandle`] and observe it through [`ShellEvent`]s.

use shared::{domain::TimerMode, protocol::SaveSessionRequest};
use tokio::{
    sync::{broadcast, mpsc, oneshot},
    task::JoinHandle,
    time::{self, Instant},
};
use tracing::{debug, info};

use crate::{
    auto_hide::{AutoHideController, HideTicket, Visibility},
    clock::{Clock, MonotonicClock},
    display::DisplayTime,
    engine::{CompletionEvent, EngineSnapshot, EngineStatus, TickOutcome, TimerEngine},
    error::{ClientError, EngineError},
};

pub const EVENT_CHANNEL_CAPACITY: usize = 1024;
const COMMAND_QUEUE_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellEvent {
    /// Emitted only when the rendered text changes.
    Display(DisplayTime),
    StatusChanged(EngineStatus),
    ModeChanged(TimerMode),
    LapRecorded { number: usize, time: String },
    Completed(CompletionEvent),
    ControlsHidden,
    ControlsShown,
    Rejected(EngineError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub engine: EngineSnapshot,
    pub controls_hidden: bool,
}

enum Command {
    Configure {
        minutes: u32,
        seconds: u32,
        reply: oneshot::Sender<Result<(), EngineError>>,
    },
    Start {
        reply: oneshot::Sender<Result<(), EngineError>>,
    },
    Toggle {
        reply: oneshot::Sender<Result<(), EngineError>>,
    },
    Pause,
    Reset,
    Lap,
    SwitchMode(TimerMode),
    Activity,
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    SessionDraft {
        reply: oneshot::Sender<Result<SaveSessionRequest, EngineError>>,
    },
    Shutdown,
}

#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    events: broadcast::Sender<ShellEvent>,
}

impl SessionHandle {
    /// Spawns the session loop on the current tokio runtime. The loop ends
    /// when every handle is dropped or [`SessionHandle::shutdown`] is called.
    pub fn spawn(mode: TimerMode) -> (Self, JoinHandle<()>) {
        let (commands, queue) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let clock = MonotonicClock::new();
        let actor = SessionActor {
            engine: TimerEngine::new(clock, mode),
            auto_hide: AutoHideController::new(),
            clock,
            events: events.clone(),
            next_tick: None,
            last_display: None,
        };
        let task = tokio::spawn(actor.run(queue));
        (Self { commands, events }, task)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ShellEvent> {
        self.events.subscribe()
    }

    pub async fn configure(&self, minutes: u32, seconds: u32) -> Result<(), ClientError> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Configure {
            minutes,
            seconds,
            reply,
        })
        .await?;
        Ok(receive(response).await??)
    }

    pub async fn start(&self) -> Result<(), ClientError> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Start { reply }).await?;
        Ok(receive(response).await??)
    }

    /// Pauses a running session, otherwise starts it.
    pub async fn toggle(&self) -> Result<(), ClientError> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Toggle { reply }).await?;
        Ok(receive(response).await??)
    }

    pub async fn pause(&self) -> Result<(), ClientError> {
        self.send(Command::Pause).await
    }

    pub async fn reset(&self) -> Result<(), ClientError> {
        self.send(Command::Reset).await
    }

    pub async fn lap(&self) -> Result<(), ClientError> {
        self.send(Command::Lap).await
    }

    pub async fn switch_mode(&self, mode: TimerMode) -> Result<(), ClientError> {
        self.send(Command::SwitchMode(mode)).await
    }

    pub async fn activity(&self) -> Result<(), ClientError> {
        self.send(Command::Activity).await
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, ClientError> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Snapshot { reply }).await?;
        receive(response).await
    }

    pub async fn session_draft(&self) -> Result<SaveSessionRequest, ClientError> {
        let (reply, response) = oneshot::channel();
        self.send(Command::SessionDraft { reply }).await?;
        Ok(receive(response).await??)
    }

    pub async fn shutdown(&self) -> Result<(), ClientError> {
        self.send(Command::Shutdown).await
    }

    async fn send(&self, command: Command) -> Result<(), ClientError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| ClientError::ActorStopped)
    }
}

async fn receive<T>(response: oneshot::Receiver<T>) -> Result<T, ClientError> {
    response.await.map_err(|_| ClientError::ActorStopped)
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

struct SessionActor {
    engine: TimerEngine<MonotonicClock>,
    auto_hide: AutoHideController,
    clock: MonotonicClock,
    events: broadcast::Sender<ShellEvent>,
    next_tick: Option<Instant>,
    last_display: Option<DisplayTime>,
}

impl SessionActor {
    async fn run(mut self, mut queue: mpsc::Receiver<Command>) {
        self.publish_display();
        loop {
            let tick_at = self.next_tick;
            let hide = self.auto_hide.pending();
            let hide_at = hide.map(|ticket| self.clock.instant_at(ticket.due_at_millis));

            tokio::select! {
                command = queue.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle(command),
                },
                _ = sleep_until_deadline(tick_at) => self.on_tick(),
                _ = sleep_until_deadline(hide_at) => {
                    if let Some(ticket) = hide {
                        self.on_hide_due(ticket);
                    }
                }
            }
        }
        debug!("timer session loop stopped");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Configure {
                minutes,
                seconds,
                reply,
            } => {
                let result = self.engine.configure(minutes, seconds);
                match result {
                    Ok(()) => {
                        debug!(minutes, seconds, "timer configured");
                        self.publish_status();
                        self.publish_display();
                    }
                    Err(err) => self.emit(ShellEvent::Rejected(err)),
                }
                let _ = reply.send(result);
            }
            Command::Start { reply } => {
                let _ = reply.send(self.start());
            }
            Command::Toggle { reply } => {
                let result = if self.engine.is_running() {
                    self.pause();
                    Ok(())
                } else {
                    self.start()
                };
                let _ = reply.send(result);
            }
            Command::Pause => self.pause(),
            Command::Reset => {
                self.engine.reset();
                self.stop_ticking();
                self.publish_status();
                self.publish_display();
            }
            Command::Lap => {
                let recorded = self.engine.record_lap().map(str::to_owned);
                if let Some(time) = recorded {
                    let number = self.engine.laps().len();
                    debug!(number, %time, "lap recorded");
                    self.emit(ShellEvent::LapRecorded { number, time });
                }
            }
            Command::SwitchMode(mode) => {
                self.engine.switch_mode(mode);
                self.stop_ticking();
                self.emit(ShellEvent::ModeChanged(mode));
                self.publish_status();
                self.publish_display();
            }
            Command::Activity => {
                let change = self
                    .auto_hide
                    .on_activity(self.engine.is_running(), self.clock.now_millis());
                self.publish_visibility(change);
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(SessionSnapshot {
                    engine: self.engine.snapshot(),
                    controls_hidden: self.auto_hide.is_hidden(),
                });
            }
            Command::SessionDraft { reply } => {
                let _ = reply.send(self.engine.session_draft());
            }
            Command::Shutdown => {}
        }
    }

    fn start(&mut self) -> Result<(), EngineError> {
        if self.engine.is_running() {
            return Ok(());
        }
        if let Err(err) = self.engine.start() {
            self.emit(ShellEvent::Rejected(err));
            return Err(err);
        }

        // Replacing the deadline drops any earlier tick stream.
        self.next_tick = Some(Instant::now() + self.engine.tick_period());
        self.auto_hide.on_engine_start(self.clock.now_millis());
        info!(mode = %self.engine.mode(), "session started");
        self.publish_status();
        self.publish_display();
        Ok(())
    }

    fn pause(&mut self) {
        if self.engine.pause() {
            self.stop_ticking();
            self.publish_status();
        }
    }

    fn stop_ticking(&mut self) {
        self.next_tick = None;
        let change = self.auto_hide.on_engine_pause_or_reset();
        self.publish_visibility(change);
    }

    fn on_tick(&mut self) {
        match self.engine.tick() {
            TickOutcome::NotRunning => self.next_tick = None,
            TickOutcome::Advanced(_) => {
                self.publish_display();
                self.schedule_next_tick();
            }
            TickOutcome::Completed(event) => {
                info!(target_seconds = event.target_seconds, "countdown completed");
                self.publish_display();
                self.emit(ShellEvent::Completed(event));
                self.stop_ticking();
                self.publish_status();
            }
        }
    }

    fn schedule_next_tick(&mut self) {
        let period = self.engine.tick_period();
        let now = Instant::now();
        let next = self.next_tick.map_or(now + period, |previous| previous + period);
        // A stalled loop skips the missed ticks instead of bursting them.
        self.next_tick = Some(if next <= now { now + period } else { next });
    }

    fn on_hide_due(&mut self, ticket: HideTicket) {
        let change = self
            .auto_hide
            .fire_hide_if_still_running(ticket, self.engine.is_running());
        self.publish_visibility(change);
    }

    fn publish_display(&mut self) {
        let display = self.engine.current_display();
        if self.last_display.as_ref() == Some(&display) {
            return;
        }
        self.last_display = Some(display.clone());
        self.emit(ShellEvent::Display(display));
    }

    fn publish_status(&self) {
        self.emit(ShellEvent::StatusChanged(self.engine.status()));
    }

    fn publish_visibility(&self, change: Option<Visibility>) {
        match change {
            Some(Visibility::Hidden) => self.emit(ShellEvent::ControlsHidden),
            Some(Visibility::Visible) => self.emit(ShellEvent::ControlsShown),
            None => {}
        }
    }

    fn emit(&self, event: ShellEvent) {
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
#[path = "tests/actor_tests.rs"]
mod tests;
