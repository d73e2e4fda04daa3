//! Rate-limited logging utilities.
//!
//! A failing upstream turns every request into a log line; `LogThrottle`
//! keeps that to one line per interval while counting what was swallowed.

use std::time::{Duration, Instant};

/// A lightweight rate limiter for logging to prevent log storms.
#[derive(Debug)]
pub struct LogThrottle {
    last_log_time: Option<Instant>,
    suppressed_count: u64,
    interval: Duration,
}

impl LogThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            last_log_time: None,
            suppressed_count: 0,
            interval,
        }
    }

    /// Decide whether the caller should emit its log line.
    ///
    /// Returns `Some(suppressed)` when logging is allowed, carrying the
    /// number of messages swallowed since the previous emission; `None`
    /// when the line should be dropped.
    pub fn check(&mut self) -> Option<u64> {
        let now = Instant::now();
        match self.last_log_time {
            Some(last) if now.duration_since(last) < self.interval => {
                self.suppressed_count += 1;
                None
            }
            _ => {
                self.last_log_time = Some(now);
                Some(std::mem::take(&mut self.suppressed_count))
            }
        }
    }
}
