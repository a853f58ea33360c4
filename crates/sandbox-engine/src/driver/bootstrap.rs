use anyhow::{Context, Result};

use crate::core::{Client, ContextOptions, DriverConfig};
use crate::host::{GraphicsContext, Notifier, TimeSource};
use crate::time::EpochClock;

use super::FrameDriver;

/// Result of a successful bootstrap.
pub struct Launched<G, C, T> {
    /// The acquired graphics context, already configured.
    pub context: G,
    pub driver: FrameDriver<C, T>,
}

/// One-shot startup sequence.
#[derive(Debug, Clone, Default)]
pub struct Bootstrapper {
    config: DriverConfig,
}

impl Bootstrapper {
    pub fn new(config: DriverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Runs the startup sequence.
    ///
    /// `acquire` is asked for a graphics context with the configured options.
    /// If it fails, `notifier` receives the fatal message exactly once and the
    /// client factory is never called. Otherwise blending is configured (when
    /// enabled), the client is constructed from the configured context and the
    /// epoch is read from `time`.
    pub fn launch<G, C, T, N, A, F>(
        self,
        acquire: A,
        make_client: F,
        time: T,
        notifier: &N,
    ) -> Result<Launched<G, C, T>>
    where
        G: GraphicsContext,
        C: Client,
        T: TimeSource,
        N: Notifier + ?Sized,
        A: FnOnce(&ContextOptions) -> Result<G>,
        F: FnOnce(&G) -> Result<C>,
    {
        let mut context = match acquire(&self.config.context) {
            Ok(ctx) => ctx,
            Err(err) => {
                log::error!("graphics context unavailable: {err:#}");
                notifier.fatal(&self.config.fatal_message);
                return Err(err.context("graphics context unavailable"));
            }
        };

        if self.config.enable_alpha_blending {
            context.enable_alpha_blending();
            log::debug!("alpha blending enabled (src_alpha, one_minus_src_alpha)");
        }

        let client = make_client(&context).context("failed to construct client")?;
        let clock = EpochClock::new(time);

        log::info!(
            "frame driver ready (blending: {}, antialias: {}, update args: {:?})",
            self.config.enable_alpha_blending,
            self.config.context.antialias,
            self.config.update_args,
        );

        Ok(Launched {
            context,
            driver: FrameDriver::new(client, clock, &self.config),
        })
    }
}
