use std::sync::Once;

use env_logger::{Builder, WriteStyle};
use log::LevelFilter;

/// Crates that flood `info` with per-frame GPU chatter.
const NOISY_CRATES: &[&str] = &["wgpu_core", "wgpu_hal", "naga"];

/// Where the log filter comes from, in priority order: `filter`, then
/// `RUST_LOG`, then `level` with [`NOISY_CRATES`] held at `warn`.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// `env_logger` directives, e.g. `"sandbox_engine=trace,wgpu=warn"`.
    pub filter: Option<String>,
    pub level: LevelFilter,
    pub write_style: WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: None,
            level: LevelFilter::Info,
            write_style: WriteStyle::Auto,
        }
    }
}

impl LoggingConfig {
    /// Same as the default, at `level`.
    pub fn with_level(level: LevelFilter) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }

    fn builder(&self, rust_log: Option<&str>) -> Builder {
        let mut builder = Builder::new();
        builder.write_style(self.write_style);

        match self.filter.as_deref().or(rust_log) {
            Some(directives) => {
                builder.parse_filters(directives);
            }
            None => {
                builder.filter_level(self.level);
                for krate in NOISY_CRATES {
                    builder.filter_module(krate, LevelFilter::Warn.min(self.level));
                }
            }
        }

        builder
    }
}

static INIT: Once = Once::new();

/// Installs `env_logger` as the `log` backend. Only the first call counts.
///
/// A logger installed by someone else (test harness, embedding app) wins.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let rust_log = std::env::var("RUST_LOG").ok();
        if config.builder(rust_log.as_deref()).try_init().is_ok() {
            log::debug!("env_logger installed (level {})", config.level);
        }
    });
}
