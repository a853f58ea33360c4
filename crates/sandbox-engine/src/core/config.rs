use crate::coords::SurfaceSize;

/// Options passed to the graphics-context factory.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextOptions {
    /// Antialiasing hint (WebGL `antialias` context attribute).
    pub antialias: bool,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self { antialias: true }
    }
}

/// How the spatial arguments of `Client::update` are filled.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum UpdateArgs {
    /// `update(t, height, height)`: the historical call shape, where the width
    /// slot also receives the height. Kept as default for compatibility.
    #[default]
    HeightTwice,
    /// `update(t, height, width)`.
    HeightWidth,
}

impl UpdateArgs {
    /// Returns the `(height, width)` pair handed to the client.
    #[inline]
    pub fn resolve(self, size: SurfaceSize) -> (f64, f64) {
        let h = f64::from(size.height);
        match self {
            UpdateArgs::HeightTwice => (h, h),
            UpdateArgs::HeightWidth => (h, f64::from(size.width)),
        }
    }
}

/// What the loop does after a frame's resize/update/render sequence fails.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum FrameErrorPolicy {
    /// Log the error and keep going. The next frame is already scheduled.
    #[default]
    Continue,
    /// Stop the loop and hand the error back to the host.
    Halt,
}

/// Frame driver configuration.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Configure standard alpha blending once at bootstrap.
    pub enable_alpha_blending: bool,
    pub context: ContextOptions,
    pub update_args: UpdateArgs,
    pub on_frame_error: FrameErrorPolicy,
    /// Text of the notification shown when no graphics context is available.
    pub fatal_message: String,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            enable_alpha_blending: false,
            context: ContextOptions::default(),
            update_args: UpdateArgs::default(),
            on_frame_error: FrameErrorPolicy::default(),
            fatal_message: "Failed to initialize webgl".to_string(),
        }
    }
}

impl DriverConfig {
    pub fn alpha_blending(mut self, enabled: bool) -> Self {
        self.enable_alpha_blending = enabled;
        self
    }

    pub fn antialias(mut self, enabled: bool) -> Self {
        self.context.antialias = enabled;
        self
    }

    pub fn update_args(mut self, args: UpdateArgs) -> Self {
        self.update_args = args;
        self
    }

    pub fn on_frame_error(mut self, policy: FrameErrorPolicy) -> Self {
        self.on_frame_error = policy;
        self
    }

    pub fn fatal_message(mut self, message: impl Into<String>) -> Self {
        self.fatal_message = message.into();
        self
    }
}
