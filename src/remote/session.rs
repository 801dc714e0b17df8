use crate::config::RemoteHost;
use crate::deploy::{DeployError, Result};
use async_trait::async_trait;
use std::path::Path;
use tracing::warn;

/// A command channel to one remote host.
///
/// Every call blocks until the remote side finishes. A non-zero exit is an
/// error unless the call opted into `warn_only`.
#[async_trait]
pub trait RemoteSession: Send + Sync {
    fn host(&self) -> &RemoteHost;

    /// Runs a command and captures its output.
    async fn run(&self, command: &str, options: RunOptions) -> Result<CommandResult>;

    /// Runs a command with its output attached to the local terminal.
    async fn stream(&self, command: &str, options: RunOptions) -> Result<()>;

    /// Copies a local file to `remote`, a full destination file path.
    async fn put(&self, local: &Path, remote: &str, options: PutOptions) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub sudo: bool,
    pub warn_only: bool,
}

impl RunOptions {
    pub fn sudo() -> Self {
        Self {
            sudo: true,
            warn_only: false,
        }
    }

    pub fn warn_only(mut self) -> Self {
        self.warn_only = true;
        self
    }

    /// The command line actually sent to the host.
    pub fn render(&self, command: &str) -> String {
        if self.sudo {
            format!("sudo {command}")
        } else {
            command.to_string()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PutOptions {
    pub use_sudo: bool,
}

impl PutOptions {
    pub fn sudo() -> Self {
        Self { use_sudo: true }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandResult {
    pub success: bool,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandResult {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            exit_code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            exit_code,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Turns a failed result into `RemoteCommandFailed`, or logs it when the
    /// caller tolerates failure.
    pub fn check(self, host: &RemoteHost, command: &str, warn_only: bool) -> Result<Self> {
        if self.success {
            return Ok(self);
        }
        if warn_only {
            warn!(
                "Command failed on {} (exit code {}), continuing: {}: {}",
                host,
                self.exit_code,
                command,
                self.stderr.trim()
            );
            return Ok(self);
        }
        Err(DeployError::RemoteCommandFailed {
            host: host.to_string(),
            command: command.to_string(),
            exit_code: self.exit_code,
            stderr: self.stderr.trim().to_string(),
        })
    }
}
