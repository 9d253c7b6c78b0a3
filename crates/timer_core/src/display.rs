use std::fmt;

use shared::duration::{format_clock, format_millis_field};

/// Rendered clock face: `HH:MM:SS`, plus a `mmm` field for the stopwatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayTime {
    clock: String,
    millis: Option<String>,
}

impl DisplayTime {
    pub fn countdown(remaining_seconds: u64) -> Self {
        Self {
            clock: format_clock(remaining_seconds),
            millis: None,
        }
    }

    pub fn elapsed(elapsed_millis: u64) -> Self {
        Self {
            clock: format_clock(elapsed_millis / 1000),
            millis: Some(format_millis_field(elapsed_millis)),
        }
    }

    pub fn clock_text(&self) -> &str {
        &self.clock
    }

    pub fn millis_field(&self) -> Option<&str> {
        self.millis.as_deref()
    }
}

impl fmt::Display for DisplayTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.millis {
            Some(millis) => write!(f, "{}.{millis}", self.clock),
            None => f.write_str(&self.clock),
        }
    }
}
