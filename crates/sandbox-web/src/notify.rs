use web_sys::Window;

use sandbox_engine::host::Notifier;

/// Shows fatal messages with `window.alert`.
pub struct AlertNotifier {
    window: Window,
}

impl AlertNotifier {
    pub fn new(window: Window) -> Self {
        Self { window }
    }
}

impl Notifier for AlertNotifier {
    fn fatal(&self, message: &str) {
        log::error!("{message}");
        if self.window.alert_with_message(message).is_err() {
            log::warn!("alert() is blocked on this page");
        }
    }
}
