use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);
    };
}

id_newtype!(SessionId);

/// Whether a run counts down from a configured target or counts up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerMode {
    #[default]
    Timer,
    Stopwatch,
}

impl TimerMode {
    pub fn as_str(self) -> &'static str {
        match self {
            TimerMode::Timer => "timer",
            TimerMode::Stopwatch => "stopwatch",
        }
    }
}

impl fmt::Display for TimerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown timer mode '{0}', expected 'timer' or 'stopwatch'")]
pub struct ParseTimerModeError(pub String);

impl FromStr for TimerMode {
    type Err = ParseTimerModeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.eq_ignore_ascii_case("timer") {
            Ok(TimerMode::Timer)
        } else if value.eq_ignore_ascii_case("stopwatch") {
            Ok(TimerMode::Stopwatch)
        } else {
            Err(ParseTimerModeError(value.to_string()))
        }
    }
}
