use std::cell::RefCell;
use std::io::{self, Write};

use super::Notifier;

/// Notifier that only writes to the log. Used where no modal UI exists.
#[derive(Debug, Default, Copy, Clone)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn fatal(&self, message: &str) {
        log::error!("{message}");
    }
}

/// Writes fatal messages to a stream as well as the log.
///
/// On native hosts the terminal is the closest thing to an alert box:
/// `StreamNotifier::stderr()` reaches the user even when logging is filtered
/// out or never initialized.
pub struct StreamNotifier<W> {
    out: RefCell<W>,
}

impl<W: Write> StreamNotifier<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: RefCell::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

impl StreamNotifier<io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write> Notifier for StreamNotifier<W> {
    fn fatal(&self, message: &str) {
        log::error!("{message}");

        let mut out = self.out.borrow_mut();
        if let Err(e) = writeln!(out, "error: {message}").and_then(|()| out.flush()) {
            log::warn!("could not write fatal message: {e}");
        }
    }
}
