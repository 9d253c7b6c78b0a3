pub mod actor;
pub mod auto_hide;
pub mod client;
pub mod clock;
pub mod display;
pub mod engine;
pub mod error;

pub use actor::{SessionHandle, SessionSnapshot, ShellEvent};
pub use auto_hide::{AutoHideController, Visibility, AUTO_HIDE_DELAY};
pub use client::{preset_from_record, SessionClient};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use display::DisplayTime;
pub use engine::{
    CompletionEvent, EngineSnapshot, EngineStatus, TickOutcome, TimerEngine,
    STOPWATCH_TICK_PERIOD, TIMER_TICK_PERIOD,
};
pub use error::{ClientError, EngineError};
