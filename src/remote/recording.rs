//! Session that records what would be sent instead of sending it
//!
//! Backs `--dry-run` and lets tests assert the exact command sequence a task
//! issues. Commands succeed with empty output unless a canned response was
//! registered for a matching prefix.

use crate::config::RemoteHost;
use crate::deploy::Result;
use crate::remote::{CommandResult, PutOptions, RemoteSession, RunOptions};
use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedOp {
    Run { command: String, warn_only: bool },
    Stream { command: String },
    Put {
        local: PathBuf,
        remote: String,
        use_sudo: bool,
    },
}

impl fmt::Display for RecordedOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordedOp::Run { command, warn_only } => {
                write!(f, "run: {command}")?;
                if *warn_only {
                    write!(f, " (failure tolerated)")?;
                }
                Ok(())
            }
            RecordedOp::Stream { command } => write!(f, "run: {command}"),
            RecordedOp::Put {
                local,
                remote,
                use_sudo,
            } => {
                write!(f, "put: {} -> {remote}", local.display())?;
                if *use_sudo {
                    write!(f, " (sudo)")?;
                }
                Ok(())
            }
        }
    }
}

pub struct RecordingSession {
    host: RemoteHost,
    echo: bool,
    ops: Mutex<Vec<RecordedOp>>,
    responses: Vec<(String, CommandResult)>,
}

impl RecordingSession {
    pub fn new(host: RemoteHost) -> Self {
        Self {
            host,
            echo: false,
            ops: Mutex::new(Vec::new()),
            responses: Vec::new(),
        }
    }

    /// Prints every operation as it is recorded.
    pub fn echoing(mut self) -> Self {
        self.echo = true;
        self
    }

    /// Registers the result returned for commands starting with `prefix`.
    /// The first matching registration wins.
    pub fn with_response(mut self, prefix: impl Into<String>, result: CommandResult) -> Self {
        self.responses.push((prefix.into(), result));
        self
    }

    pub fn ops(&self) -> Vec<RecordedOp> {
        self.ops
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Rendered command lines of run and stream operations, in order.
    pub fn commands(&self) -> Vec<String> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                RecordedOp::Run { command, .. } | RecordedOp::Stream { command } => Some(command),
                RecordedOp::Put { .. } => None,
            })
            .collect()
    }

    fn record(&self, op: RecordedOp) {
        if self.echo {
            println!("[{}] {}", self.host, op);
        }
        self.ops
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(op);
    }

    fn response_for(&self, command: &str) -> CommandResult {
        self.responses
            .iter()
            .find(|(prefix, _)| command.starts_with(prefix.as_str()))
            .map(|(_, result)| result.clone())
            .unwrap_or_else(|| CommandResult::ok(""))
    }
}

#[async_trait]
impl RemoteSession for RecordingSession {
    fn host(&self) -> &RemoteHost {
        &self.host
    }

    async fn run(&self, command: &str, options: RunOptions) -> Result<CommandResult> {
        let command = options.render(command);
        self.record(RecordedOp::Run {
            command: command.clone(),
            warn_only: options.warn_only,
        });
        self.response_for(&command)
            .check(&self.host, &command, options.warn_only)
    }

    async fn stream(&self, command: &str, options: RunOptions) -> Result<()> {
        let command = options.render(command);
        self.record(RecordedOp::Stream {
            command: command.clone(),
        });
        self.response_for(&command)
            .check(&self.host, &command, options.warn_only)
            .map(|_| ())
    }

    async fn put(&self, local: &Path, remote: &str, options: PutOptions) -> Result<()> {
        self.record(RecordedOp::Put {
            local: local.to_path_buf(),
            remote: remote.to_string(),
            use_sudo: options.use_sudo,
        });
        Ok(())
    }
}
