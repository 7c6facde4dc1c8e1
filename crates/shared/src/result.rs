//! Result helpers for shared error handling.

use crate::errors::ErrorEnvelope;

/// Shared result type used across the workspace.
pub type Result<T, E = ErrorEnvelope> = std::result::Result<T, E>;

/// Extension helpers for results carrying an [`ErrorEnvelope`].
pub trait ResultExt<T> {
    /// Tag the error with the console operation that produced it.
    fn with_operation(self, operation: &'static str) -> Result<T>;

    /// Tag the error with the config section it concerns.
    fn with_section(self, section: &str) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_operation(self, operation: &'static str) -> Self {
        self.map_err(|error| error.with_metadata("operation", operation))
    }

    fn with_section(self, section: &str) -> Self {
        self.map_err(|error| error.with_metadata("section", section))
    }
}
