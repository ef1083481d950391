//! Pomodoro countdown
//!
//! A plain state machine driven by `tick()`, one call per elapsed second.
//! Rendering and scheduling belong to the caller; completion is reported as a
//! `TimerEvent::Completed` carrying the record to log.

use crate::events::{PomodoroRecord, SessionKind};

/// Longest interval a timer accepts; one day
pub const MAX_SESSION_MINUTES: u32 = 24 * 60;

fn interval_secs(minutes: u32) -> u32 {
    minutes.clamp(1, MAX_SESSION_MINUTES) * 60
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    /// Timer is paused or not started
    Idle,
    Ticked { remaining_secs: u32 },
    Completed(PomodoroRecord),
}

#[derive(Debug, Clone)]
pub struct PomodoroTimer {
    kind: SessionKind,
    length_secs: u32,
    remaining_secs: u32,
    running: bool,
}

impl Default for PomodoroTimer {
    fn default() -> Self {
        Self::new(SessionKind::Work, SessionKind::Work.default_minutes())
    }
}

impl PomodoroTimer {
    pub fn new(kind: SessionKind, minutes: u32) -> Self {
        let length_secs = interval_secs(minutes);
        Self {
            kind,
            length_secs,
            remaining_secs: length_secs,
            running: false,
        }
    }

    pub fn kind(&self) -> SessionKind {
        self.kind
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Stop and rewind the current interval
    pub fn reset(&mut self) {
        self.pause();
        self.remaining_secs = self.length_secs;
    }

    /// Switch to a break of `minutes`; paused until started again
    pub fn set_break(&mut self, minutes: u32) {
        self.pause();
        self.kind = if minutes >= SessionKind::LongBreak.default_minutes() {
            SessionKind::LongBreak
        } else {
            SessionKind::ShortBreak
        };
        self.length_secs = interval_secs(minutes);
        self.remaining_secs = self.length_secs;
    }

    /// Advance one second.
    ///
    /// The tick after the countdown reaches zero completes the session and
    /// rewinds the timer to a paused work interval.
    pub fn tick(&mut self) -> TimerEvent {
        if !self.running {
            return TimerEvent::Idle;
        }
        if self.remaining_secs == 0 {
            let record = PomodoroRecord::completed(self.kind, self.length_secs / 60);
            self.running = false;
            self.kind = SessionKind::Work;
            self.length_secs = SessionKind::Work.default_minutes() * 60;
            self.remaining_secs = self.length_secs;
            return TimerEvent::Completed(record);
        }
        self.remaining_secs -= 1;
        TimerEvent::Ticked {
            remaining_secs: self.remaining_secs,
        }
    }

    pub fn display(&self) -> String {
        format_clock(self.remaining_secs)
    }
}

/// `MM:SS`
pub fn format_clock(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
