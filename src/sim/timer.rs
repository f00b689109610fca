//! Repeating countdown driven by frame deltas.
//!
//! Pausing is simply not calling `advance`: the remaining time is kept as-is,
//! so a paused timer resumes exactly where it froze.

use std::time::Duration;

#[derive(Clone, Debug)]
pub struct IntervalTimer {
    period: Duration,
    remaining: Duration,
    running: bool,
}

impl IntervalTimer {
    pub fn new(period: Duration) -> Self {
        let period = period.max(Duration::from_millis(1));
        IntervalTimer { period, remaining: period, running: true }
    }

    /// Replace the period and restart the countdown from the full period.
    pub fn rearm(&mut self, period: Duration) {
        self.period = period.max(Duration::from_millis(1));
        self.remaining = self.period;
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    #[cfg(test)]
    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    /// Count down by `dt`; returns how many times the timer elapsed.
    pub fn advance(&mut self, dt: Duration) -> u32 {
        if !self.running {
            return 0;
        }
        let mut left = dt;
        let mut fired = 0;
        while left >= self.remaining {
            left -= self.remaining;
            self.remaining = self.period;
            fired += 1;
        }
        self.remaining -= left;
        fired
    }
}
