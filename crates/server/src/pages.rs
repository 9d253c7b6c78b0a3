//! Server-rendered HTML for the timer page and the session history.

use std::fmt::Write as _;

use shared::{domain::TimerMode, duration::parse_preset, protocol::SessionRecord};

const STYLE: &str = "body{font-family:sans-serif;margin:0;background:#111;color:#eee}\
main{max-width:40rem;margin:0 auto;padding:2rem}\
.display{font-size:4rem;font-variant-numeric:tabular-nums;text-align:center}\
.display .millis{font-size:2rem;color:#999}\
.controls{display:flex;gap:.5rem;justify-content:center;transition:opacity .3s}\
.controls.hidden{opacity:0;pointer-events:none}\
.session{border-bottom:1px solid #333;padding:.75rem 0}\
.laps{color:#aaa;margin:.25rem 0 0 1rem}";

/// Timer page. The duration inputs start from the last saved timer, if any.
pub fn render_index(last_timer: Option<&SessionRecord>) -> String {
    let (minutes, seconds) = last_timer
        .and_then(|record| parse_preset(&record.duration))
        .unwrap_or((0, 0));

    let body = format!(
        r#"<section class="modes">
  <button id="timer-mode" class="mode active" data-mode="timer">Timer</button>
  <button id="stopwatch-mode" class="mode" data-mode="stopwatch">Stopwatch</button>
</section>
<section class="display" id="display">
  <span id="clock">00:00:00</span><span class="millis" id="millis" hidden>.000</span>
</section>
<section class="inputs" id="timer-inputs">
  <label>Minutes <input type="number" id="minutes" min="0" value="{minutes}"></label>
  <label>Seconds <input type="number" id="seconds" min="0" max="59" value="{seconds}"></label>
</section>
<section class="controls" id="controls">
  <button id="start">Start</button>
  <button id="pause">Pause</button>
  <button id="reset">Reset</button>
  <button id="lap" hidden>Lap</button>
  <button id="save">Save</button>
</section>
<ol class="laps" id="laps"></ol>
<p><a href="/history">History</a></p>"#
    );
    layout("Focus Timer", &body)
}

/// History page listing the given sessions in order.
pub fn render_history(sessions: &[SessionRecord]) -> String {
    let mut body = String::from("<h1>History</h1>\n<p><a href=\"/\">Back to timer</a></p>\n");
    if sessions.is_empty() {
        body.push_str("<p class=\"empty\">No sessions saved yet.</p>\n");
        return layout("Focus Timer History", &body);
    }

    body.push_str("<section class=\"sessions\">\n");
    for session in sessions {
        let _ = write!(
            body,
            "<article class=\"session\" data-id=\"{id}\">\n  <strong>{kind}</strong> \
             <span class=\"duration\">{duration}</span> \
             <time datetime=\"{stamp}\">{created}</time>\n  \
             <button class=\"delete\" data-id=\"{id}\">Delete</button>\n",
            id = session.id.0,
            kind = mode_label(session.kind),
            duration = escape(&session.duration),
            stamp = session.created_at.to_rfc3339(),
            created = session.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
        );
        if !session.laps.is_empty() {
            body.push_str("  <ol class=\"laps\">\n");
            for (index, lap) in session.laps.iter().enumerate() {
                let _ = writeln!(body, "    <li>Lap {}: {}</li>", index + 1, escape(lap));
            }
            body.push_str("  </ol>\n");
        }
        body.push_str("</article>\n");
    }
    body.push_str("</section>\n");
    layout("Focus Timer History", &body)
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n<style>{STYLE}</style>\n</head>\n\
         <body>\n<main>\n{body}\n</main>\n</body>\n</html>\n"
    )
}

fn mode_label(mode: TimerMode) -> &'static str {
    match mode {
        TimerMode::Timer => "Timer",
        TimerMode::Stopwatch => "Stopwatch",
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
