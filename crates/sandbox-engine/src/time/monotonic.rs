use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, ensure};

use crate::host::{FrameSource, TimeSource};

/// `Instant`-based time source. Milliseconds are counted from construction.
#[derive(Debug, Copy, Clone)]
pub struct MonotonicTime {
    origin: Instant,
}

impl MonotonicTime {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicTime {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicTime {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1_000.0
    }
}

/// Fixed-rate refresh signal for hosts without a compositor (headless runs).
///
/// Sleeps until the next deadline. Deadlines advance by whole intervals, so a
/// slow frame is not followed by a burst of catch-up frames.
#[derive(Debug, Clone)]
pub struct IntervalFrames {
    interval: Duration,
    next: Option<Instant>,
    remaining: Option<u64>,
}

impl IntervalFrames {
    /// Default refresh rate used when none is configured.
    pub const DEFAULT_HZ: u32 = 60;

    /// Fails on a zero interval, which could never advance a deadline.
    pub fn new(interval: Duration) -> Result<Self> {
        ensure!(!interval.is_zero(), "refresh interval must be non-zero");
        Ok(Self {
            interval,
            next: None,
            remaining: None,
        })
    }

    /// `hz` refreshes per second. Rates too high to express as a non-zero
    /// `Duration` are rejected.
    pub fn with_rate(hz: u32) -> Result<Self> {
        ensure!(hz > 0, "refresh rate must be positive");
        Self::new(Duration::from_secs_f64(1.0 / f64::from(hz)))
            .with_context(|| format!("refresh rate {hz} Hz is out of range"))
    }

    /// Stops yielding frames after `frames` refreshes.
    pub fn limit(mut self, frames: u64) -> Self {
        self.remaining = Some(frames);
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Default for IntervalFrames {
    fn default() -> Self {
        Self {
            interval: Duration::from_nanos(1_000_000_000 / u64::from(Self::DEFAULT_HZ)),
            next: None,
            remaining: None,
        }
    }
}

impl FrameSource for IntervalFrames {
    fn wait_for_frame(&mut self) -> bool {
        if let Some(remaining) = self.remaining.as_mut() {
            if *remaining == 0 {
                return false;
            }
            *remaining -= 1;
        }

        let now = Instant::now();
        let deadline = match self.next {
            Some(deadline) => deadline,
            // First frame fires immediately.
            None => now,
        };

        if deadline > now {
            thread::sleep(deadline - now);
        }

        let mut next = deadline + self.interval;
        let after = Instant::now();
        while next <= after {
            next += self.interval;
        }
        self.next = Some(next);

        true
    }
}
