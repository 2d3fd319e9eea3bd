//! Reconnect backoff schedule

use std::time::Duration;

/// Delay before each reconnect attempt, one entry per attempt
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackoffCalculator {
    delays: Vec<Duration>,
}

impl BackoffCalculator {
    pub fn new(delays: Vec<Duration>) -> Self {
        Self { delays }
    }

    /// Number of attempts the schedule allows
    pub fn attempts(&self) -> usize {
        self.delays.len()
    }

    /// Delay to wait before the given attempt (1-indexed)
    ///
    /// The first attempt uses the first entry; past the end the last entry repeats.
    pub fn delay_before_attempt(&self, attempt: u32) -> Duration {
        let index = (attempt as usize).saturating_sub(1);
        self.delays
            .get(index)
            .or_else(|| self.delays.last())
            .copied()
            .unwrap_or(Duration::ZERO)
    }
}
