// ── Tokio-backed process runner ──
//
// One child per call. Output is streamed into per-invocation buffers while
// the child runs so a chatty command can never stall on a full pipe.

use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use futures_util::future::BoxFuture;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::completion::{Completion, DeferredAction};
use super::{CommandRunner, CommandSpec, ProcessOutput};
use crate::error::ProcessError;

/// How long to keep draining pipes after the child is gone. A grandchild
/// that inherited the pipe can hold it open indefinitely.
const DRAIN_GRACE: Duration = Duration::from_millis(250);

type Buffer = Arc<Mutex<Vec<u8>>>;

/// Who settled the invocation first.
#[derive(Debug)]
enum Resolution {
    Exited(ExitStatus),
    TimedOut,
    Cancelled,
    WaitFailed(String),
}

/// Executes commands as child processes with timeout and cancellation.
///
/// Cancelling the runner's token terminates every child it currently owns;
/// those invocations resolve with [`ProcessError::Terminated`].
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    cancel: CancellationToken,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancellation(cancel: CancellationToken) -> Self {
        Self { cancel }
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub async fn execute(&self, spec: &CommandSpec) -> ProcessOutput {
        let started = Instant::now();

        let mut child = match Command::new(&spec.program)
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                warn!(program = %spec.program, error = %e, "failed to spawn command");
                return ProcessOutput::spawn_failed(&spec.program, e.to_string());
            }
        };
        debug!(command = %spec, pid = ?child.id(), "spawned");

        let stdout_buf = Buffer::default();
        let stderr_buf = Buffer::default();
        let readers = [
            child
                .stdout
                .take()
                .map(|pipe| tokio::spawn(pump(pipe, Arc::clone(&stdout_buf)))),
            child
                .stderr
                .take()
                .map(|pipe| tokio::spawn(pump(pipe, Arc::clone(&stderr_buf)))),
        ];

        let (completion, resolved) = Completion::channel();
        let (kill_tx, kill_rx) = oneshot::channel::<()>();
        let timer_slot = Arc::clone(&completion);
        let deadline = DeferredAction::schedule(spec.timeout, move || {
            if timer_slot.complete(Resolution::TimedOut) {
                let _ = kill_tx.send(());
            }
        });

        let status = tokio::select! {
            status = child.wait() => status,
            Ok(()) = kill_rx => terminate(&mut child).await,
            () = self.cancel.cancelled() => {
                completion.complete(Resolution::Cancelled);
                terminate(&mut child).await
            }
        };
        completion.complete(match status {
            Ok(status) => Resolution::Exited(status),
            Err(e) => Resolution::WaitFailed(e.to_string()),
        });

        deadline.shutdown().await;
        for reader in readers.into_iter().flatten() {
            drain(reader).await;
        }

        let resolution = resolved
            .await
            .unwrap_or_else(|_| Resolution::WaitFailed("completion dropped".into()));
        let output = classify(
            spec,
            resolution,
            take_text(&stdout_buf),
            take_text(&stderr_buf),
        );

        #[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &output.error {
            Some(ProcessError::Timeout { .. }) => {
                warn!(program = %spec.program, elapsed_ms, "command timed out");
            }
            _ => {
                debug!(program = %spec.program, exit_code = output.exit_code, elapsed_ms, "exited");
            }
        }
        output
    }
}

impl CommandRunner for ProcessRunner {
    fn run<'a>(&'a self, spec: &'a CommandSpec) -> BoxFuture<'a, ProcessOutput> {
        Box::pin(self.execute(spec))
    }
}

async fn terminate(child: &mut Child) -> std::io::Result<ExitStatus> {
    // Already-exited children make start_kill fail; wait still reaps them.
    let _ = child.start_kill();
    child.wait().await
}

async fn pump<R: AsyncRead + Unpin>(mut pipe: R, sink: Buffer) {
    let mut chunk = [0u8; 4096];
    loop {
        match pipe.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => sink
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .extend_from_slice(&chunk[..n]),
        }
    }
}

async fn drain(reader: JoinHandle<()>) {
    let abort = reader.abort_handle();
    if tokio::time::timeout(DRAIN_GRACE, reader).await.is_err() {
        abort.abort();
    }
}

fn take_text(buffer: &Buffer) -> String {
    let bytes = std::mem::take(&mut *buffer.lock().unwrap_or_else(PoisonError::into_inner));
    String::from_utf8_lossy(&bytes).into_owned()
}

#[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
fn classify(spec: &CommandSpec, resolution: Resolution, stdout: String, stderr: String) -> ProcessOutput {
    let timeout_ms = spec.timeout.as_millis() as u64;
    let (exit_code, error) = match resolution {
        Resolution::Exited(status) => match status.code() {
            Some(0) => (0, None),
            Some(code) => (
                code,
                Some(ProcessError::NonZeroExit {
                    code,
                    stderr: stderr.trim().to_owned(),
                }),
            ),
            // killed by a signal
            None => (
                ProcessOutput::NO_EXIT_CODE,
                Some(ProcessError::Timeout { timeout_ms }),
            ),
        },
        Resolution::TimedOut => (
            ProcessOutput::NO_EXIT_CODE,
            Some(ProcessError::Timeout { timeout_ms }),
        ),
        Resolution::Cancelled => (ProcessOutput::NO_EXIT_CODE, Some(ProcessError::Terminated)),
        Resolution::WaitFailed(reason) => (
            ProcessOutput::SPAWN_FAILED,
            Some(ProcessError::NonZeroExit {
                code: ProcessOutput::SPAWN_FAILED,
                stderr: reason,
            }),
        ),
    };
    ProcessOutput {
        stdout,
        stderr,
        exit_code,
        error,
    }
}
