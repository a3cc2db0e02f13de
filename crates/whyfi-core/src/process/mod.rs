// ── External command execution ──
//
// `CommandRunner` is the seam between probes and the operating system.
// `ProcessRunner` is the real implementation; tests substitute scripted
// runners that return canned `ProcessOutput`s.

mod completion;
mod runner;

use std::fmt;
use std::time::Duration;

use futures_util::future::BoxFuture;

use crate::error::ProcessError;

pub use completion::{Completion, DeferredAction};
pub use runner::ProcessRunner;

/// A single command invocation: program, arguments and deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub timeout: Duration,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout,
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Everything a finished (or abandoned) invocation produced.
///
/// `error` is `None` only for a zero exit status.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub error: Option<ProcessError>,
}

impl ProcessOutput {
    /// Exit code reported when the executable could not be started.
    pub const SPAWN_FAILED: i32 = -1;
    /// Exit code reported when the child was killed before producing one.
    pub const NO_EXIT_CODE: i32 = -2;

    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            ..Self::default()
        }
    }

    pub fn failure(code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        let stderr = stderr.into();
        Self {
            stdout: stdout.into(),
            error: Some(ProcessError::NonZeroExit {
                code,
                stderr: stderr.clone(),
            }),
            stderr,
            exit_code: code,
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
    pub fn timeout(timeout: Duration) -> Self {
        Self {
            exit_code: Self::NO_EXIT_CODE,
            error: Some(ProcessError::Timeout {
                timeout_ms: timeout.as_millis() as u64,
            }),
            ..Self::default()
        }
    }

    pub fn spawn_failed(program: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            exit_code: Self::SPAWN_FAILED,
            error: Some(ProcessError::Spawn {
                program: program.into(),
                reason: reason.into(),
            }),
            ..Self::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn is_timeout(&self) -> bool {
        self.error.as_ref().is_some_and(ProcessError::is_timeout)
    }
}

/// Runs external commands. Implementations never panic and never fail
/// outright: every outcome is encoded in the returned `ProcessOutput`.
pub trait CommandRunner: Send + Sync {
    fn run<'a>(&'a self, spec: &'a CommandSpec) -> BoxFuture<'a, ProcessOutput>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_display_joins_args() {
        let spec = CommandSpec::new("ping", Duration::from_secs(1)).args(["-c", "1", "1.1.1.1"]);
        assert_eq!(spec.to_string(), "ping -c 1 1.1.1.1");
    }

    #[test]
    fn output_constructors_classify() {
        assert!(ProcessOutput::success("ok").is_success());
        assert!(ProcessOutput::timeout(Duration::from_secs(2)).is_timeout());

        let failed = ProcessOutput::failure(2, "", "boom");
        assert_eq!(failed.exit_code, 2);
        assert_eq!(
            failed.error,
            Some(ProcessError::NonZeroExit {
                code: 2,
                stderr: "boom".into()
            })
        );

        let missing = ProcessOutput::spawn_failed("nope", "not found");
        assert_eq!(missing.exit_code, ProcessOutput::SPAWN_FAILED);
        assert!(!missing.is_timeout());
    }
}
