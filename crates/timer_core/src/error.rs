use shared::domain::TimerMode;
use thiserror::Error;

/// Rejections from the engine. The state is left untouched when one is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("please set a timer duration")]
    InvalidDuration,
    #[error("the timer cannot be reconfigured while it is running")]
    ConfigureWhileRunning,
    #[error("switch to timer mode to set a duration")]
    ConfigureInStopwatch,
    #[error("no {0} session to save")]
    NothingToSave(TimerMode),
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("session store request failed: {0}")]
    Persistence(String),
    #[error("http transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid server url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("timer session has stopped")]
    ActorStopped,
}
