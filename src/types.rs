// src/types.rs

//! Constants and small enums shared between the supervisor and the watcher.

use std::fmt;
use std::time::Duration;

/// Port used when a listen or remote address does not name one.
pub const DEFAULT_PORT: u16 = 7373;

/// Where the build command is told to write its output.
pub const DEFAULT_ARTIFACT_PATH: &str = ".built";

/// Name the artifact is promoted to, and the file that actually gets executed.
pub const DEFAULT_STABLE_PATH: &str = "tbuild-bin";

/// Flag appended to the build command, followed by the artifact path.
pub const OUTPUT_FLAG: &str = "-o";

/// Default build tool invocation.
pub const DEFAULT_BUILD: [&str; 2] = ["go", "build"];

/// Receive buffer for trigger datagrams. Longer payloads are truncated.
pub const DEFAULT_MAX_DATAGRAM: usize = 2048;

/// Largest payload a UDP datagram can carry over IPv4.
pub const MAX_UDP_PAYLOAD: usize = 65_507;

/// Payload the watcher sends. The supervisor ignores payload contents.
pub const TRIGGER_PAYLOAD: &[u8] = b"build";

/// Quiet period the watcher waits for before notifying.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Longest line forwarded from a child stream. Longer runs without a
/// newline are split into chunks of this size.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// How long `wait()` gives stream readers to drain after the child exits.
pub const DEFAULT_READER_DRAIN: Duration = Duration::from_secs(2);

/// Which standard stream a line of child output came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stream {
    Stdout,
    Stderr,
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stream::Stdout => f.write_str("stdout"),
            Stream::Stderr => f.write_str("stderr"),
        }
    }
}

/// Lifecycle of a spawned OS process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    NotStarted,
    Running,
    /// Exited on its own. Processes terminated by a foreign signal report -1.
    Exited(i32),
    /// Terminated by us via `kill()`.
    Killed,
}

impl ProcessStatus {
    pub fn is_terminated(self) -> bool {
        matches!(self, ProcessStatus::Exited(_) | ProcessStatus::Killed)
    }

    pub fn success(self) -> bool {
        self == ProcessStatus::Exited(0)
    }
}
