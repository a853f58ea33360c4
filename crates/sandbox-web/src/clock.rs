use web_sys::{Performance, Window};

use sandbox_engine::host::TimeSource;

/// `performance.now()`, falling back to `Date.now()` where the Performance API
/// is missing. Only the former is monotonic.
pub struct PerformanceTime {
    performance: Option<Performance>,
}

impl PerformanceTime {
    pub fn new(window: &Window) -> Self {
        let performance = window.performance();
        if performance.is_none() {
            log::warn!("performance API unavailable, timing falls back to Date.now()");
        }
        Self { performance }
    }
}

impl TimeSource for PerformanceTime {
    fn now_ms(&self) -> f64 {
        match &self.performance {
            Some(p) => p.now(),
            None => js_sys::Date::now(),
        }
    }
}
