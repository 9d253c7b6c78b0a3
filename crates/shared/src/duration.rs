//! Text helpers for the `HH:MM:SS` / `.mmm` clock strings that appear both on
//! screen and in persisted session records.

pub const SECONDS_PER_MINUTE: u64 = 60;
pub const SECONDS_PER_HOUR: u64 = 3600;

/// Formats whole seconds as zero-padded `HH:MM:SS`.
pub fn format_clock(total_seconds: u64) -> String {
    let hours = total_seconds / SECONDS_PER_HOUR;
    let minutes = (total_seconds % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE;
    let seconds = total_seconds % SECONDS_PER_MINUTE;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Formats the sub-second part of a millisecond count as three digits.
pub fn format_millis_field(elapsed_millis: u64) -> String {
    format!("{:03}", elapsed_millis % 1000)
}

/// Reads a stored duration back into a `(minutes, seconds)` timer preset.
///
/// Accepts `HH:MM:SS` and `MM:SS`, each optionally followed by `.mmm`. Hours
/// are folded into minutes. Unparseable fields count as zero; fewer than two
/// fields yields `None`.
pub fn parse_preset(text: &str) -> Option<(u32, u32)> {
    let clock = text.trim().split('.').next().unwrap_or_default();
    let fields: Vec<u32> = clock
        .split(':')
        .map(|field| field.trim().parse::<u32>().unwrap_or(0))
        .collect();

    match fields.as_slice() {
        [hours, minutes, seconds] => {
            Some((hours.saturating_mul(60).saturating_add(*minutes), *seconds))
        }
        [minutes, seconds] => Some((*minutes, *seconds)),
        _ => None,
    }
}
