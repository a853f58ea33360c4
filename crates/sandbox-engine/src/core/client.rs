use anyhow::Result;

/// Control directive produced by each driven frame.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrameControl {
    Continue,
    Stop,
}

/// Per-frame contract implemented by the simulation/rendering core.
///
/// The driver knows nothing else about a client. Within a frame `update` is
/// always called before `render`, exactly once each.
pub trait Client {
    /// Advances the client. `elapsed_ms` is measured from the bootstrap epoch.
    fn update(&mut self, elapsed_ms: f64, height: f64, width: f64) -> Result<()>;

    /// Draws the current state.
    fn render(&mut self) -> Result<()>;
}

impl<C: Client + ?Sized> Client for Box<C> {
    fn update(&mut self, elapsed_ms: f64, height: f64, width: f64) -> Result<()> {
        (**self).update(elapsed_ms, height, width)
    }

    fn render(&mut self) -> Result<()> {
        (**self).render()
    }
}

/// Client that only logs what it is asked to do.
///
/// Stands in for a real game core when bringing up a host.
#[derive(Debug, Default)]
pub struct LoggingClient {
    updates: u64,
    renders: u64,
    last_update: Option<(f64, f64, f64)>,
}

impl LoggingClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn updates(&self) -> u64 {
        self.updates
    }

    pub fn renders(&self) -> u64 {
        self.renders
    }

    /// Arguments of the most recent `update` call.
    pub fn last_update(&self) -> Option<(f64, f64, f64)> {
        self.last_update
    }
}

impl Client for LoggingClient {
    fn update(&mut self, elapsed_ms: f64, height: f64, width: f64) -> Result<()> {
        self.updates += 1;
        self.last_update = Some((elapsed_ms, height, width));
        log::trace!("update t={elapsed_ms:.1}ms h={height} w={width}");
        Ok(())
    }

    fn render(&mut self) -> Result<()> {
        self.renders += 1;
        log::trace!("render #{}", self.renders);
        Ok(())
    }
}
