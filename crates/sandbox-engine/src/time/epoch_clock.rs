use crate::host::TimeSource;

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameTime {
    /// Milliseconds since the epoch captured at bootstrap.
    pub elapsed_ms: f64,

    /// Monotonic frame counter, starting at zero.
    pub frame_index: u64,
}

/// Clock measuring elapsed time from a fixed epoch.
///
/// The epoch is read once in [`EpochClock::new`] and never moved, so elapsed
/// time is never reset. It is clamped at zero, which keeps it non-negative if
/// the underlying source steps backwards (wall clocks can).
#[derive(Debug, Clone)]
pub struct EpochClock<T> {
    source: T,
    epoch_ms: f64,
    frame_index: u64,
}

impl<T: TimeSource> EpochClock<T> {
    /// Captures the current time of `source` as the epoch.
    pub fn new(source: T) -> Self {
        let epoch_ms = source.now_ms();
        Self {
            source,
            epoch_ms,
            frame_index: 0,
        }
    }

    #[inline]
    pub fn epoch_ms(&self) -> f64 {
        self.epoch_ms
    }

    /// Number of ticks taken so far.
    #[inline]
    pub fn frames(&self) -> u64 {
        self.frame_index
    }

    /// Reads the source and returns a new `FrameTime`.
    pub fn tick(&mut self) -> FrameTime {
        let elapsed_ms = (self.source.now_ms() - self.epoch_ms).max(0.0);

        let ft = FrameTime {
            elapsed_ms,
            frame_index: self.frame_index,
        };

        self.frame_index = self.frame_index.wrapping_add(1);

        ft
    }
}
