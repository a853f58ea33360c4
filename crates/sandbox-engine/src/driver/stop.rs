use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared running flag of a frame driver.
///
/// Clones observe the same flag. Clearing it makes the next frame a no-op and
/// ends any loop driving the driver. There is no way to restart.
#[derive(Debug, Clone)]
pub struct StopHandle {
    running: Arc<AtomicBool>,
}

impl StopHandle {
    pub(crate) fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn stop(&self) {
        if self.running.swap(false, Ordering::AcqRel) {
            log::debug!("frame driver stop requested");
        }
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}
