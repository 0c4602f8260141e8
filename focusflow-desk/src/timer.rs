//! Countdown focus timer. Ticked once per second by the front-end.

use std::fmt;
use std::str::FromStr;

pub const DEFAULT_MINUTES: u32 = 25;
pub const CYCLES_PER_ROUND: u32 = 4;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum SessionType {
    #[default]
    Work,
    Study,
    Break,
    Exercise,
    Meditation,
}

impl SessionType {
    pub const ALL: [SessionType; 5] = [
        SessionType::Work,
        SessionType::Study,
        SessionType::Break,
        SessionType::Exercise,
        SessionType::Meditation,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SessionType::Work => "work",
            SessionType::Study => "study",
            SessionType::Break => "break",
            SessionType::Exercise => "exercise",
            SessionType::Meditation => "meditation",
        }
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SessionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        SessionType::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown session type: {s}"))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TimerEvent {
    /// The countdown reached zero and the timer stopped.
    Finished { session_type: SessionType, cycle: u32 },
}

#[derive(Clone, Debug)]
pub struct CountdownTimer {
    duration_secs: u32,
    remaining_secs: u32,
    running: bool,
    session_type: SessionType,
    cycle: u32,
}

impl Default for CountdownTimer {
    fn default() -> Self { Self::new(DEFAULT_MINUTES) }
}

impl CountdownTimer {
    /// Zero minutes is bumped to one.
    pub fn new(minutes: u32) -> Self {
        let duration_secs = minutes.max(1).saturating_mul(60);
        Self {
            duration_secs,
            remaining_secs: duration_secs,
            running: false,
            session_type: SessionType::default(),
            cycle: 1,
        }
    }

    /// Start or continue counting down. A finished timer starts over.
    pub fn start(&mut self) {
        if self.remaining_secs == 0 {
            self.remaining_secs = self.duration_secs;
        }
        if !self.running {
            log::info!(target: "timer", "{} timer started at {}", self.session_type, format_mm_ss(self.remaining_secs));
        }
        self.running = true;
    }

    pub fn pause(&mut self) {
        if self.running {
            log::info!(target: "timer", "paused at {}", format_mm_ss(self.remaining_secs));
        }
        self.running = false;
    }

    /// Stop and restore the full duration.
    pub fn reset(&mut self) {
        self.running = false;
        self.remaining_secs = self.duration_secs;
    }

    /// Advance by one second.
    pub fn tick(&mut self) -> Option<TimerEvent> {
        if !self.running || self.remaining_secs == 0 {
            return None;
        }
        self.remaining_secs -= 1;
        if self.remaining_secs > 0 {
            return None;
        }

        self.running = false;
        let finished = TimerEvent::Finished { session_type: self.session_type, cycle: self.cycle };
        self.cycle = self.cycle % CYCLES_PER_ROUND + 1;
        log::info!(target: "timer", "{} session finished, next cycle {}", self.session_type, self.cycle);
        Some(finished)
    }

    /// Takes effect immediately when the timer is not running, otherwise on
    /// the next reset.
    pub fn set_duration_minutes(&mut self, minutes: u32) {
        self.duration_secs = minutes.max(1).saturating_mul(60);
        if !self.running {
            self.remaining_secs = self.duration_secs;
        }
    }

    pub fn set_session_type(&mut self, session_type: SessionType) { self.session_type = session_type; }

    #[inline] pub fn session_type(&self) -> SessionType { self.session_type }
    #[inline] pub fn remaining_seconds(&self) -> u32 { self.remaining_secs }
    #[inline] pub fn duration_seconds(&self) -> u32 { self.duration_secs }
    #[inline] pub fn is_running(&self) -> bool { self.running }
    #[inline] pub fn cycle(&self) -> u32 { self.cycle }

    pub fn cycle_label(&self) -> String {
        format!("Cycle {} of {}", self.cycle, CYCLES_PER_ROUND)
    }
}

/// `125` → `"02:05"`. Minutes are not capped at 59.
pub fn format_mm_ss(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
