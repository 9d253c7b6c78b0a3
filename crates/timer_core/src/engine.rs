//! Countdown/stopwatch state machine.
//!
//! The engine never schedules anything itself: whoever owns it calls
//! [`TimerEngine::tick`] every [`TimerEngine::tick_period`] while it runs and
//! reacts to the returned [`TickOutcome`]. All arithmetic is in whole
//! milliseconds read from a [`Clock`].

use std::time::Duration;

use shared::{domain::TimerMode, duration::format_clock, protocol::SaveSessionRequest};

use crate::{
    clock::{Clock, MonotonicClock},
    display::DisplayTime,
    error::EngineError,
};

/// Countdowns only render whole seconds.
pub const TIMER_TICK_PERIOD: Duration = Duration::from_millis(100);
/// The stopwatch renders milliseconds.
pub const STOPWATCH_TICK_PERIOD: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    Idle,
    Running,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionEvent {
    pub target_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    NotRunning,
    Advanced(DisplayTime),
    /// The countdown reached zero; the engine is already back in `Idle`.
    Completed(CompletionEvent),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSnapshot {
    pub mode: TimerMode,
    pub status: EngineStatus,
    pub target_seconds: u64,
    pub elapsed_millis: u64,
    pub laps: Vec<String>,
    pub display: DisplayTime,
}

pub struct TimerEngine<C: Clock = MonotonicClock> {
    clock: C,
    mode: TimerMode,
    status: EngineStatus,
    configured_seconds: u64,
    elapsed_millis: u64,
    /// Elapsed total at the moment of the last start/resume.
    resume_base_millis: u64,
    /// Clock reading at the last start/resume; `Some` exactly while running.
    resumed_at_millis: Option<u64>,
    laps: Vec<String>,
}

impl<C: Clock> TimerEngine<C> {
    pub fn new(clock: C, mode: TimerMode) -> Self {
        Self {
            clock,
            mode,
            status: EngineStatus::Idle,
            configured_seconds: 0,
            elapsed_millis: 0,
            resume_base_millis: 0,
            resumed_at_millis: None,
            laps: Vec::new(),
        }
    }

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    pub fn status(&self) -> EngineStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == EngineStatus::Running
    }

    pub fn elapsed_millis(&self) -> u64 {
        self.elapsed_millis
    }

    pub fn laps(&self) -> &[String] {
        &self.laps
    }

    /// Countdown origin; always zero for the stopwatch.
    pub fn target_seconds(&self) -> u64 {
        match self.mode {
            TimerMode::Timer => self.configured_seconds,
            TimerMode::Stopwatch => 0,
        }
    }

    pub fn tick_period(&self) -> Duration {
        match self.mode {
            TimerMode::Timer => TIMER_TICK_PERIOD,
            TimerMode::Stopwatch => STOPWATCH_TICK_PERIOD,
        }
    }

    /// A countdown that ran out rests at zero until it is restarted or reset.
    pub fn is_completed(&self) -> bool {
        self.mode == TimerMode::Timer
            && self.status == EngineStatus::Idle
            && self.configured_seconds > 0
            && self.elapsed_millis >= self.configured_seconds * 1000
    }

    /// Sets the countdown target. A paused countdown is discarded; the
    /// stopwatch has no target and refuses.
    pub fn configure(&mut self, minutes: u32, seconds: u32) -> Result<(), EngineError> {
        if self.mode == TimerMode::Stopwatch {
            return Err(EngineError::ConfigureInStopwatch);
        }
        if self.is_running() {
            return Err(EngineError::ConfigureWhileRunning);
        }
        self.configured_seconds = u64::from(minutes) * 60 + u64::from(seconds);
        self.reset();
        Ok(())
    }

    /// Starts or resumes. Starting while already running changes nothing.
    pub fn start(&mut self) -> Result<(), EngineError> {
        if self.is_running() {
            return Ok(());
        }
        if self.mode == TimerMode::Timer {
            if self.configured_seconds == 0 {
                return Err(EngineError::InvalidDuration);
            }
            if self.is_completed() {
                self.elapsed_millis = 0;
            }
        }

        self.resume_base_millis = self.elapsed_millis;
        self.resumed_at_millis = Some(self.clock.now_millis());
        self.status = EngineStatus::Running;
        Ok(())
    }

    /// Freezes elapsed time at the value computed by the last tick. Returns
    /// whether the engine was running.
    pub fn pause(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.resumed_at_millis = None;
        self.status = EngineStatus::Paused;
        true
    }

    pub fn reset(&mut self) {
        self.status = EngineStatus::Idle;
        self.elapsed_millis = 0;
        self.resume_base_millis = 0;
        self.resumed_at_millis = None;
        self.laps.clear();
    }

    pub fn tick(&mut self) -> TickOutcome {
        let Some(resumed_at) = self.resumed_at_millis else {
            return TickOutcome::NotRunning;
        };
        let run_millis = self.clock.now_millis().saturating_sub(resumed_at);
        self.elapsed_millis = self.elapsed_millis.max(self.resume_base_millis + run_millis);

        if self.mode == TimerMode::Timer {
            let target = self.configured_seconds;
            if self.elapsed_millis / 1000 >= target {
                self.elapsed_millis = target * 1000;
                self.resume_base_millis = self.elapsed_millis;
                self.resumed_at_millis = None;
                self.status = EngineStatus::Idle;
                return TickOutcome::Completed(CompletionEvent {
                    target_seconds: target,
                });
            }
        }

        TickOutcome::Advanced(self.current_display())
    }

    /// Records the displayed stopwatch time. Ignored unless the stopwatch runs.
    pub fn record_lap(&mut self) -> Option<&str> {
        if self.mode != TimerMode::Stopwatch || !self.is_running() {
            return None;
        }
        let lap = self.current_display().to_string();
        self.laps.push(lap);
        self.laps.last().map(String::as_str)
    }

    pub fn switch_mode(&mut self, mode: TimerMode) {
        self.reset();
        self.mode = mode;
    }

    pub fn current_display(&self) -> DisplayTime {
        match self.mode {
            TimerMode::Timer => {
                let elapsed_seconds = self.elapsed_millis / 1000;
                DisplayTime::countdown(self.configured_seconds.saturating_sub(elapsed_seconds))
            }
            TimerMode::Stopwatch => DisplayTime::elapsed(self.elapsed_millis),
        }
    }

    /// Payload for persisting the current run.
    pub fn session_draft(&self) -> Result<SaveSessionRequest, EngineError> {
        match self.mode {
            TimerMode::Timer => {
                if self.configured_seconds == 0 {
                    return Err(EngineError::NothingToSave(TimerMode::Timer));
                }
                Ok(SaveSessionRequest {
                    kind: TimerMode::Timer,
                    duration: format_clock(self.configured_seconds),
                    laps: Vec::new(),
                })
            }
            TimerMode::Stopwatch => {
                if self.elapsed_millis == 0 {
                    return Err(EngineError::NothingToSave(TimerMode::Stopwatch));
                }
                Ok(SaveSessionRequest {
                    kind: TimerMode::Stopwatch,
                    duration: self.current_display().clock_text().to_string(),
                    laps: self.laps.clone(),
                })
            }
        }
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            mode: self.mode,
            status: self.status,
            target_seconds: self.target_seconds(),
            elapsed_millis: self.elapsed_millis,
            laps: self.laps.clone(),
            display: self.current_display(),
        }
    }
}

#[cfg(test)]
#[path = "tests/engine_tests.rs"]
mod tests;
