use shared::{domain::TimerMode, duration::parse_preset};

pub const KEY_HELP: &str = "[space/s] start-pause  [r] reset  [l] lap  [m] switch mode  \
[t MM:SS] set timer  [w] save  [q] quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Toggle,
    Reset,
    Lap,
    SwitchMode,
    Configure { minutes: u32, seconds: u32 },
    Save,
    Quit,
}

/// Maps one line of terminal input to an action. A bare Enter (or a line of
/// spaces) toggles, matching the space key.
pub fn parse_key(line: &str) -> Option<KeyAction> {
    let line = line.trim();
    match line.chars().next().map(|key| key.to_ascii_lowercase()) {
        None | Some('s') => Some(KeyAction::Toggle),
        Some('r') => Some(KeyAction::Reset),
        Some('l') => Some(KeyAction::Lap),
        Some('m') => Some(KeyAction::SwitchMode),
        Some('t') => parse_duration(&line[1..]),
        Some('w') => Some(KeyAction::Save),
        Some('q') => Some(KeyAction::Quit),
        Some(_) => None,
    }
}

/// `MM:SS`, `HH:MM:SS` or whole minutes.
fn parse_duration(text: &str) -> Option<KeyAction> {
    let text = text.trim();
    let (minutes, seconds) = match parse_preset(text) {
        Some(preset) => preset,
        None => (text.parse().ok()?, 0),
    };
    Some(KeyAction::Configure { minutes, seconds })
}

pub fn other_mode(mode: TimerMode) -> TimerMode {
    match mode {
        TimerMode::Timer => TimerMode::Stopwatch,
        TimerMode::Stopwatch => TimerMode::Timer,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn space_and_enter_toggle() {
        assert_eq!(parse_key(" \n"), Some(KeyAction::Toggle));
        assert_eq!(parse_key(""), Some(KeyAction::Toggle));
        assert_eq!(parse_key("S"), Some(KeyAction::Toggle));
    }

    #[test]
    fn letters_map_to_actions() {
        assert_eq!(parse_key("r"), Some(KeyAction::Reset));
        assert_eq!(parse_key("l"), Some(KeyAction::Lap));
        assert_eq!(parse_key("m"), Some(KeyAction::SwitchMode));
        assert_eq!(parse_key("w"), Some(KeyAction::Save));
        assert_eq!(parse_key("quit"), Some(KeyAction::Quit));
        assert_eq!(parse_key("x"), None);
    }

    #[test]
    fn timer_key_reads_a_duration() {
        assert_eq!(
            parse_key("t 25:00"),
            Some(KeyAction::Configure {
                minutes: 25,
                seconds: 0
            })
        );
        assert_eq!(
            parse_key("T 1:02:30"),
            Some(KeyAction::Configure {
                minutes: 62,
                seconds: 30
            })
        );
        assert_eq!(
            parse_key("t 5"),
            Some(KeyAction::Configure {
                minutes: 5,
                seconds: 0
            })
        );
        assert_eq!(parse_key("t"), None);
        assert_eq!(parse_key("t soon"), None);
    }

    #[test]
    fn mode_switch_flips() {
        assert_eq!(other_mode(TimerMode::Timer), TimerMode::Stopwatch);
        assert_eq!(other_mode(TimerMode::Stopwatch), TimerMode::Timer);
    }
}
