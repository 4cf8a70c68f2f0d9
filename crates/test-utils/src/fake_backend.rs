use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Semaphore;
use tbuild::errors::{Result, TbuildError};
use tbuild::exec::{BoxFuture, ChildProcess, CommandSpec, OutputSink, ProcessBackend};
use tbuild::types::{ProcessStatus, Stream};

/// How a fake program behaves once "spawned".
#[derive(Clone, Default)]
pub struct FakeScript {
    /// `Some(code)`: exits with `code` when waited on. `None`: runs until killed.
    pub exit: Option<i32>,
    /// Hold `wait()` until the test calls `FakeBackend::release`.
    pub gated: bool,
    /// `spawn` returns an error.
    pub fail_spawn: bool,
    /// `kill()` takes this long before the process counts as dead.
    pub kill_delay: Duration,
    /// `kill()` returns an error and the process keeps running.
    pub fail_kill: bool,
    /// Lines written to stdout right after spawning.
    pub output: Vec<String>,
    /// Runs when the process exits with code 0 (e.g. to drop an artifact).
    pub on_success: Option<Arc<dyn Fn() + Send + Sync>>,
}

impl fmt::Debug for FakeScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FakeScript")
            .field("exit", &self.exit)
            .field("gated", &self.gated)
            .field("fail_spawn", &self.fail_spawn)
            .field("kill_delay", &self.kill_delay)
            .field("fail_kill", &self.fail_kill)
            .finish_non_exhaustive()
    }
}

impl FakeScript {
    pub fn exits(code: i32) -> Self {
        Self {
            exit: Some(code),
            ..Self::default()
        }
    }

    pub fn long_running() -> Self {
        Self::default()
    }

    pub fn spawn_fails() -> Self {
        Self {
            fail_spawn: true,
            ..Self::default()
        }
    }

    pub fn gated(mut self) -> Self {
        self.gated = true;
        self
    }

    pub fn kill_delay(mut self, delay: Duration) -> Self {
        self.kill_delay = delay;
        self
    }

    pub fn kill_fails(mut self) -> Self {
        self.fail_kill = true;
        self
    }

    pub fn prints(mut self, line: &str) -> Self {
        self.output.push(line.to_string());
        self
    }

    pub fn on_success(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_success = Some(Arc::new(f));
        self
    }
}

/// Everything observable that happened to fake processes, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeEvent {
    Spawned {
        id: u32,
        program: String,
        args: Vec<String>,
    },
    Exited {
        id: u32,
        code: i32,
    },
    Killed {
        id: u32,
    },
}

#[derive(Default)]
struct Inner {
    scripts: Mutex<HashMap<String, FakeScript>>,
    gates: Mutex<HashMap<String, Arc<Semaphore>>>,
    events: Mutex<Vec<FakeEvent>>,
    live: Mutex<HashMap<String, usize>>,
    max_live: Mutex<HashMap<String, usize>>,
    next_id: AtomicU32,
}

/// A `ProcessBackend` that never touches the OS.
///
/// Programs without a script exit 0 immediately.
#[derive(Clone, Default)]
pub struct FakeBackend {
    inner: Arc<Inner>,
}

impl fmt::Debug for FakeBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FakeBackend").finish_non_exhaustive()
    }
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, program: &str, script: FakeScript) {
        self.inner
            .scripts
            .lock()
            .unwrap()
            .insert(program.to_string(), script);
    }

    /// Let `n` gated `wait()` calls of `program` complete.
    pub fn release(&self, program: &str, n: usize) {
        self.gate(program).add_permits(n);
    }

    pub fn events(&self) -> Vec<FakeEvent> {
        self.inner.events.lock().unwrap().clone()
    }

    pub fn spawn_count(&self, program: &str) -> usize {
        self.spawned_args(program).len()
    }

    pub fn spawned_args(&self, program: &str) -> Vec<Vec<String>> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                FakeEvent::Spawned { program: p, args, .. } if p == program => Some(args),
                _ => None,
            })
            .collect()
    }

    /// Processes of `program` currently neither exited nor killed.
    pub fn live_count(&self, program: &str) -> usize {
        self.inner
            .live
            .lock()
            .unwrap()
            .get(program)
            .copied()
            .unwrap_or(0)
    }

    /// Highest `live_count` ever observed for `program`.
    pub fn max_live(&self, program: &str) -> usize {
        self.inner
            .max_live
            .lock()
            .unwrap()
            .get(program)
            .copied()
            .unwrap_or(0)
    }

    fn gate(&self, program: &str) -> Arc<Semaphore> {
        self.inner
            .gates
            .lock()
            .unwrap()
            .entry(program.to_string())
            .or_insert_with(|| Arc::new(Semaphore::new(0)))
            .clone()
    }

    fn record(&self, event: FakeEvent) {
        self.inner.events.lock().unwrap().push(event);
    }

    fn mark_started(&self, program: &str) {
        let mut live = self.inner.live.lock().unwrap();
        let count = live.entry(program.to_string()).or_insert(0);
        *count += 1;
        let mut max = self.inner.max_live.lock().unwrap();
        let peak = max.entry(program.to_string()).or_insert(0);
        *peak = (*peak).max(*count);
    }

    fn mark_stopped(&self, program: &str) {
        let mut live = self.inner.live.lock().unwrap();
        if let Some(count) = live.get_mut(program) {
            *count = count.saturating_sub(1);
        }
    }
}

impl ProcessBackend for FakeBackend {
    fn spawn(&self, command: &CommandSpec, sink: OutputSink) -> Result<Box<dyn ChildProcess>> {
        let script = self
            .inner
            .scripts
            .lock()
            .unwrap()
            .get(&command.program)
            .cloned()
            .unwrap_or_else(|| FakeScript::exits(0));

        if script.fail_spawn {
            return Err(TbuildError::Spawn {
                cmd: command.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            });
        }

        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.mark_started(&command.program);
        self.record(FakeEvent::Spawned {
            id,
            program: command.program.clone(),
            args: command.args.clone(),
        });

        for line in &script.output {
            sink.emit(Stream::Stdout, line.clone());
        }

        let gate = script.gated.then(|| self.gate(&command.program));
        Ok(Box::new(FakeProcess {
            id,
            program: command.program.clone(),
            script,
            gate,
            status: ProcessStatus::Running,
            backend: self.clone(),
        }))
    }
}

/// Process handed out by [`FakeBackend`].
pub struct FakeProcess {
    id: u32,
    program: String,
    script: FakeScript,
    gate: Option<Arc<Semaphore>>,
    status: ProcessStatus,
    backend: FakeBackend,
}

impl fmt::Debug for FakeProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FakeProcess")
            .field("id", &self.id)
            .field("program", &self.program)
            .field("status", &self.status)
            .finish()
    }
}

impl FakeProcess {
    async fn wait_inner(&mut self) -> Result<ProcessStatus> {
        if self.status.is_terminated() {
            return Ok(self.status);
        }

        let Some(code) = self.script.exit else {
            // Runs until killed; the caller is expected to select over this.
            std::future::pending::<()>().await;
            unreachable!();
        };

        if let Some(gate) = &self.gate {
            let permit = gate
                .acquire()
                .await
                .map_err(|e| TbuildError::Other(anyhow::anyhow!(e)))?;
            permit.forget();
        }

        self.status = ProcessStatus::Exited(code);
        self.backend.mark_stopped(&self.program);
        self.backend.record(FakeEvent::Exited { id: self.id, code });

        if code == 0 {
            if let Some(hook) = &self.script.on_success {
                hook();
            }
        }
        Ok(self.status)
    }

    async fn kill_inner(&mut self) -> Result<()> {
        if self.status.is_terminated() {
            return Ok(());
        }
        if !self.script.kill_delay.is_zero() {
            tokio::time::sleep(self.script.kill_delay).await;
        }
        if self.script.fail_kill {
            return Err(TbuildError::Other(anyhow::anyhow!(
                "operation not permitted"
            )));
        }
        self.status = ProcessStatus::Killed;
        self.backend.mark_stopped(&self.program);
        self.backend.record(FakeEvent::Killed { id: self.id });
        Ok(())
    }
}

impl ChildProcess for FakeProcess {
    fn pid(&self) -> Option<u32> {
        Some(self.id)
    }

    fn status(&self) -> ProcessStatus {
        self.status
    }

    fn wait(&mut self) -> BoxFuture<'_, Result<ProcessStatus>> {
        Box::pin(self.wait_inner())
    }

    fn kill(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(self.kill_inner())
    }
}
