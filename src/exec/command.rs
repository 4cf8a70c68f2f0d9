// src/exec/command.rs

//! What to run and where its output goes.

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::types::Stream;

/// Program plus arguments. Executed directly, never through a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Split a `[program, args...]` list. Returns `None` for an empty list.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self::new(program.clone(), args.iter().cloned()))
    }

    /// Copy of this command with `extra` appended to the arguments.
    pub fn with_args(&self, extra: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let mut out = self.clone();
        out.args.extend(extra.into_iter().map(Into::into));
        out
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

/// One line of child output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub stream: Stream,
    pub line: String,
}

/// Line-oriented destination for a child's stdout and stderr.
///
/// Lines are logged under `component` (stdout at INFO, stderr at WARN so it
/// stands out). An optional tap receives a copy of every line.
#[derive(Debug, Clone)]
pub struct OutputSink {
    component: Arc<str>,
    tap: Option<mpsc::UnboundedSender<OutputLine>>,
}

impl OutputSink {
    pub fn new(component: &str) -> Self {
        Self {
            component: Arc::from(component),
            tap: None,
        }
    }

    pub fn with_tap(mut self, tap: mpsc::UnboundedSender<OutputLine>) -> Self {
        self.tap = Some(tap);
        self
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn emit(&self, stream: Stream, line: String) {
        match stream {
            Stream::Stdout => info!(component = %self.component, "{}", line),
            Stream::Stderr => warn!(component = %self.component, stream = "stderr", "{}", line),
        }

        if let Some(tap) = &self.tap {
            let _ = tap.send(OutputLine { stream, line });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_command_gets_output_flag_appended() {
        let build = CommandSpec::from_argv(&["go".to_string(), "build".to_string()]).unwrap();
        let cmd = build.with_args(["-o", ".built"]);
        assert_eq!(cmd.program, "go");
        assert_eq!(cmd.args, vec!["build", "-o", ".built"]);
        assert_eq!(cmd.to_string(), "go build -o .built");
        // The base command is untouched.
        assert_eq!(build.args, vec!["build"]);
    }

    #[test]
    fn empty_argv_has_no_command() {
        assert!(CommandSpec::from_argv(&[]).is_none());
    }

    #[test]
    fn tap_receives_lines() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = OutputSink::new("app").with_tap(tx);
        sink.emit(Stream::Stderr, "boom".to_string());
        assert_eq!(
            rx.try_recv().unwrap(),
            OutputLine {
                stream: Stream::Stderr,
                line: "boom".to_string()
            }
        );
    }
}
