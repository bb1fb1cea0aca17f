//! Manual stopwatch, independent of the tracked data.

use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Running { since: Instant },
}

#[derive(Debug, Clone)]
pub struct Stopwatch {
    state: State,
    elapsed_seconds: u64,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            elapsed_seconds: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, State::Running { .. })
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    /// Start counting. Does nothing when already running.
    pub fn start(&mut self, now: Instant) {
        if self.is_running() {
            return;
        }
        self.state = State::Running { since: now };
        self.elapsed_seconds = 0;
    }

    /// Stop and clear the counter. Does nothing when idle.
    pub fn stop(&mut self) {
        if !self.is_running() {
            return;
        }
        self.state = State::Idle;
        self.elapsed_seconds = 0;
    }

    /// Zero the counter; a running stopwatch keeps running from `now`
    pub fn reset(&mut self, now: Instant) {
        if self.is_running() {
            self.state = State::Running { since: now };
        }
        self.elapsed_seconds = 0;
    }

    /// Advance the counter to the whole seconds elapsed at `now`
    pub fn tick(&mut self, now: Instant) {
        if let State::Running { since } = self.state {
            self.elapsed_seconds = now.saturating_duration_since(since).as_secs();
        }
    }

    pub fn display(&self) -> String {
        format_clock(self.elapsed_seconds)
    }
}

/// "HH:MM:SS"; hours keep growing past 99
pub fn format_clock(seconds: u64) -> String {
    let hours = seconds / 3600;
    let mins = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, mins, secs)
}
