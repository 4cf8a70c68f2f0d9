// src/exec/process.rs

//! Spawning and supervising a single OS process.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

use crate::errors::{Result, TbuildError};
use crate::exec::command::{CommandSpec, OutputSink};
use crate::types::{ProcessStatus, Stream, MAX_LINE_BYTES};

/// A spawned child with both output streams wired into an [`OutputSink`].
///
/// Reader tasks end on their own once the child closes its pipes. `wait()`
/// and `kill()` join them, aborting any that outlive the drain window
/// (e.g. a grandchild that inherited the pipe).
#[derive(Debug)]
pub struct ManagedProcess {
    command: String,
    pid: Option<u32>,
    child: Child,
    status: ProcessStatus,
    readers: Vec<JoinHandle<()>>,
    drain: Duration,
}

impl ManagedProcess {
    /// Start `spec` with piped stdout/stderr and a null stdin.
    ///
    /// The pipes exist before the program starts, so no early output is lost.
    /// On error no process is left running.
    pub fn spawn(spec: &CommandSpec, sink: OutputSink, drain: Duration) -> Result<Self> {
        let command = spec.to_string();

        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|source| TbuildError::Spawn {
            cmd: command.clone(),
            source,
        })?;

        // Dropping `child` on the error paths below kills it (kill_on_drop).
        let stdout = child.stdout.take().ok_or_else(|| TbuildError::Spawn {
            cmd: command.clone(),
            source: std::io::Error::other("stdout pipe missing"),
        })?;
        let stderr = child.stderr.take().ok_or_else(|| TbuildError::Spawn {
            cmd: command.clone(),
            source: std::io::Error::other("stderr pipe missing"),
        })?;

        let pid = child.id();
        debug!(component = %sink.component(), pid, cmd = %command, "process started");

        let readers = vec![
            spawn_reader(stdout, Stream::Stdout, sink.clone()),
            spawn_reader(stderr, Stream::Stderr, sink),
        ];

        Ok(Self {
            command,
            pid,
            child,
            status: ProcessStatus::Running,
            readers,
            drain,
        })
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn status(&self) -> ProcessStatus {
        self.status
    }

    /// True once both stream readers have returned.
    pub fn readers_finished(&self) -> bool {
        self.readers.iter().all(|h| h.is_finished())
    }

    /// Block until the process terminates and its output has been drained.
    pub async fn wait(&mut self) -> Result<ProcessStatus> {
        if !self.status.is_terminated() {
            let exit = self.child.wait().await?;
            self.status = ProcessStatus::Exited(exit.code().unwrap_or(-1));
        }
        self.join_readers().await;
        Ok(self.status)
    }

    /// Forcibly terminate the process and reap it.
    ///
    /// Killing a process that already exited, or was already killed, is a
    /// no-op.
    pub async fn kill(&mut self) -> Result<()> {
        if self.status.is_terminated() {
            return Ok(());
        }

        if let Some(exit) = self.child.try_wait()? {
            self.status = ProcessStatus::Exited(exit.code().unwrap_or(-1));
            debug!(pid = self.pid, status = ?self.status, "process had already exited");
            self.join_readers().await;
            return Ok(());
        }

        match self.child.kill().await {
            Ok(()) => {
                self.status = ProcessStatus::Killed;
                info!(pid = self.pid, cmd = %self.command, "process killed");
            }
            // Raced with a natural exit between try_wait and kill.
            Err(e) if e.kind() == std::io::ErrorKind::InvalidInput => {
                let code = self
                    .child
                    .try_wait()?
                    .and_then(|exit| exit.code())
                    .unwrap_or(-1);
                self.status = ProcessStatus::Exited(code);
            }
            Err(e) => return Err(e.into()),
        }

        self.join_readers().await;
        Ok(())
    }

    async fn join_readers(&mut self) {
        let deadline = Instant::now() + self.drain;
        for mut handle in self.readers.drain(..) {
            if timeout_at(deadline, &mut handle).await.is_err() {
                warn!(pid = self.pid, "output reader still open after drain window; aborting it");
                handle.abort();
            }
        }
    }
}

/// Forward `stream` line by line; a line never buffers more than
/// [`MAX_LINE_BYTES`].
fn spawn_reader<R>(stream: R, kind: Stream, sink: OutputSink) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let mut capped = (&mut reader).take(MAX_LINE_BYTES as u64);
            match capped.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    sink.emit(kind, line.trim_end_matches(['\n', '\r']).to_string());
                }
                Err(e) => {
                    debug!(stream = %kind, error = %e, "output stream read failed");
                    break;
                }
            }
        }

        debug!(component = %sink.component(), stream = %kind, "output stream closed");
    })
}
