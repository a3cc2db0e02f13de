// ── Core error types ──
//
// Process failures are data, not control flow: `ProcessError` travels
// inside `ProcessOutput` and is absorbed by the probe adapters. `CoreError`
// covers the few places that genuinely fail (configuration validation).

use thiserror::Error;

/// Why an external command did not produce a usable result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcessError {
    /// The executable could not be started (missing, not executable, ...).
    #[error("failed to spawn {program}: {reason}")]
    Spawn { program: String, reason: String },

    /// The command ran to completion with a non-zero status.
    #[error("command failed with exit code {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },

    /// The command outlived its deadline (or died from a signal) and was killed.
    #[error("command timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The command was terminated because its runner was cancelled.
    #[error("command terminated by cancellation")]
    Terminated,
}

impl ProcessError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid {field}: {reason}")]
    Config { field: String, reason: String },
}
