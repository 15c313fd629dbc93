// src/client/timer.rs

use std::time::Duration;

use tokio::time::Instant;

/// Elapsed-time counter for one presentation session (a topic run or the daily quiz).
#[derive(Debug, Clone, Copy, Default)]
pub struct Stopwatch {
    started: Option<Instant>,
    frozen: Duration,
}

impl Stopwatch {
    /// Restarts from zero.
    pub fn reset(&mut self) {
        self.started = Some(Instant::now());
        self.frozen = Duration::ZERO;
    }

    /// Freezes the reading. Stopping twice keeps the first reading.
    pub fn stop(&mut self) {
        if let Some(started) = self.started.take() {
            self.frozen = started.elapsed();
        }
    }

    pub fn is_running(&self) -> bool {
        self.started.is_some()
    }

    pub fn elapsed(&self) -> Duration {
        match self.started {
            Some(started) => started.elapsed(),
            None => self.frozen,
        }
    }

    /// Whole seconds, as sent in `timeSpent`.
    pub fn elapsed_secs(&self) -> u32 {
        u32::try_from(self.elapsed().as_secs()).unwrap_or(u32::MAX)
    }
}
