use std::rc::Rc;

use log::{debug, warn};

use crate::error::{RouxError, Warning};
use crate::io::IoStream;

/// Routes diagnostics to the error hook and remembers whether anything fatal
/// happened since the last reset.
pub struct ErrorReporter {
    io: Rc<IoStream>,
    had_error: bool,
    had_runtime_error: bool,
}

impl ErrorReporter {
    pub fn new(io: Rc<IoStream>) -> Self {
        ErrorReporter {
            io,
            had_error: false,
            had_runtime_error: false,
        }
    }

    pub fn error(&mut self, error: &RouxError) {
        debug!("Reporting error: {}", error);

        if error.is_runtime() {
            self.had_runtime_error = true;
        } else {
            self.had_error = true;
        }

        self.io.error(&error.to_string());
    }

    /// Warnings never set a flag.
    pub fn warning(&self, warning: &Warning) {
        warn!("{}", warning);
        self.io.error(&warning.to_string());
    }

    pub fn had_error(&self) -> bool {
        self.had_error
    }

    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }

    pub fn reset(&mut self) {
        self.had_error = false;
        self.had_runtime_error = false;
    }
}
