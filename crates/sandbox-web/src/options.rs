use sandbox_engine::core::{DriverConfig, FrameErrorPolicy, UpdateArgs};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Loop options exposed to JavaScript.
///
/// ```js
/// const opts = new RunOptions();
/// opts.enableAlphaBlending = true;
/// run("rustCanvas", opts);
/// ```
#[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    enable_alpha_blending: bool,
    antialias: bool,
    corrected_update_args: bool,
    halt_on_error: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            enable_alpha_blending: false,
            antialias: true,
            corrected_update_args: false,
            halt_on_error: false,
        }
    }
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
impl RunOptions {
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen(constructor))]
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen(getter = enableAlphaBlending))]
    pub fn enable_alpha_blending(&self) -> bool {
        self.enable_alpha_blending
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen(setter = enableAlphaBlending))]
    pub fn set_enable_alpha_blending(&mut self, value: bool) {
        self.enable_alpha_blending = value;
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen(getter))]
    pub fn antialias(&self) -> bool {
        self.antialias
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen(setter))]
    pub fn set_antialias(&mut self, value: bool) {
        self.antialias = value;
    }

    /// Pass `(height, width)` to `update` instead of `(height, height)`.
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen(getter = correctedUpdateArgs))]
    pub fn corrected_update_args(&self) -> bool {
        self.corrected_update_args
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen(setter = correctedUpdateArgs))]
    pub fn set_corrected_update_args(&mut self, value: bool) {
        self.corrected_update_args = value;
    }

    /// Stop the loop on the first failed frame instead of logging and carrying on.
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen(getter = haltOnError))]
    pub fn halt_on_error(&self) -> bool {
        self.halt_on_error
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen(setter = haltOnError))]
    pub fn set_halt_on_error(&mut self, value: bool) {
        self.halt_on_error = value;
    }
}

impl RunOptions {
    pub fn to_config(&self) -> DriverConfig {
        DriverConfig::default()
            .alpha_blending(self.enable_alpha_blending)
            .antialias(self.antialias)
            .update_args(if self.corrected_update_args {
                UpdateArgs::HeightWidth
            } else {
                UpdateArgs::HeightTwice
            })
            .on_frame_error(if self.halt_on_error {
                FrameErrorPolicy::Halt
            } else {
                FrameErrorPolicy::Continue
            })
    }
}
