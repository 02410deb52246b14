//! Default `HostReporter` backed by `tracing`.

use crate::traits::HostReporter;

/// Routes diagnostics to `tracing` and exits the process on fatal errors.
#[derive(Debug, Clone, Copy)]
pub struct TracingReporter {
    exit_code: i32,
}

impl TracingReporter {
    pub fn new() -> Self {
        Self { exit_code: 1 }
    }

    /// Use a specific process exit status for fatal errors.
    pub fn with_exit_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

impl Default for TracingReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl HostReporter for TracingReporter {
    fn diagnostic(&self, line: &str) {
        tracing::warn!(target: "scripthost", "{line}");
    }

    fn fatal(&self, message: &str) -> ! {
        tracing::error!(target: "scripthost", "fatal: {message}");
        std::process::exit(self.exit_code)
    }
}
