// ── Scripted command runner for unit tests ──

use std::sync::{Arc, Mutex};

use futures_util::future::BoxFuture;
use tokio::sync::Semaphore;

use crate::process::{CommandRunner, CommandSpec, ProcessOutput};

type Script = Box<dyn Fn(&CommandSpec) -> ProcessOutput + Send + Sync>;

/// Answers every command from a closure and records what was asked.
///
/// A gated runner parks each call until the test releases a permit, which
/// makes "while one is in flight" scenarios deterministic.
pub(crate) struct ScriptedRunner {
    script: Script,
    calls: Mutex<Vec<CommandSpec>>,
    gate: Option<Arc<Semaphore>>,
}

impl ScriptedRunner {
    pub(crate) fn new<F>(script: F) -> Self
    where
        F: Fn(&CommandSpec) -> ProcessOutput + Send + Sync + 'static,
    {
        Self {
            script: Box::new(script),
            calls: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    pub(crate) fn gated<F>(script: F, gate: Arc<Semaphore>) -> Self
    where
        F: Fn(&CommandSpec) -> ProcessOutput + Send + Sync + 'static,
    {
        Self {
            gate: Some(gate),
            ..Self::new(script)
        }
    }

    pub(crate) fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, program: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|spec| spec.program == program)
            .count()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run<'a>(&'a self, spec: &'a CommandSpec) -> BoxFuture<'a, ProcessOutput> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(spec.clone());
            if let Some(gate) = &self.gate {
                gate.acquire().await.unwrap().forget();
            }
            (self.script)(spec)
        })
    }
}
