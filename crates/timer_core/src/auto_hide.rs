//! Hides UI chrome after a quiet period while the engine runs.
//!
//! The controller only tracks state; the owner arms a timer for the pending
//! [`HideTicket`] and hands the ticket back when it fires. A ticket that was
//! cancelled or replaced in the meantime is ignored.

use std::time::Duration;

pub const AUTO_HIDE_DELAY: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HideTicket {
    id: u64,
    pub due_at_millis: u64,
}

#[derive(Debug, Default)]
pub struct AutoHideController {
    hidden: bool,
    pending: Option<HideTicket>,
    issued: u64,
}

impl AutoHideController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn pending(&self) -> Option<HideTicket> {
        self.pending
    }

    /// Pointer or key activity. Returns the visibility change, if any.
    pub fn on_activity(&mut self, engine_running: bool, now_millis: u64) -> Option<Visibility> {
        self.pending = None;
        let change = self.show();
        if engine_running {
            self.schedule(now_millis);
        }
        change
    }

    pub fn on_engine_start(&mut self, now_millis: u64) -> HideTicket {
        self.schedule(now_millis)
    }

    pub fn on_engine_pause_or_reset(&mut self) -> Option<Visibility> {
        self.pending = None;
        self.show()
    }

    pub fn fire_hide_if_still_running(
        &mut self,
        ticket: HideTicket,
        engine_running: bool,
    ) -> Option<Visibility> {
        if self.pending != Some(ticket) {
            return None;
        }
        self.pending = None;
        if !engine_running {
            return None;
        }
        self.hide()
    }

    fn schedule(&mut self, now_millis: u64) -> HideTicket {
        self.issued += 1;
        let ticket = HideTicket {
            id: self.issued,
            due_at_millis: now_millis + AUTO_HIDE_DELAY.as_millis() as u64,
        };
        self.pending = Some(ticket);
        ticket
    }

    fn show(&mut self) -> Option<Visibility> {
        if !self.hidden {
            return None;
        }
        self.hidden = false;
        Some(Visibility::Visible)
    }

    fn hide(&mut self) -> Option<Visibility> {
        if self.hidden {
            return None;
        }
        self.hidden = true;
        Some(Visibility::Hidden)
    }
}
