//! Remote session backed by the system `ssh` and `scp` clients

use crate::config::{DeployConfig, RemoteHost};
use crate::deploy::{DeployError, Result};
use crate::remote::{quote, CommandResult, PutOptions, RemoteSession, RunOptions};
use async_trait::async_trait;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default)]
pub struct SshOptions {
    pub key_file: Option<PathBuf>,
    pub strict_host_key_checking: String,
    pub connect_timeout_secs: Option<u64>,
    pub extra_options: Vec<String>,
}

impl SshOptions {
    pub fn from_config(config: &DeployConfig) -> Self {
        Self {
            key_file: config.key_file(),
            strict_host_key_checking: config.ssh.strict_host_key_checking.clone(),
            connect_timeout_secs: config.ssh.connect_timeout_secs,
            extra_options: config.ssh.options.clone(),
        }
    }

    /// Arguments shared by ssh and scp.
    fn common_args(&self) -> Vec<String> {
        let mut args = vec!["-o".to_string(), "BatchMode=yes".to_string()];

        if !self.strict_host_key_checking.is_empty() {
            args.push("-o".to_string());
            args.push(format!(
                "StrictHostKeyChecking={}",
                self.strict_host_key_checking
            ));
        }
        if let Some(timeout) = self.connect_timeout_secs {
            args.push("-o".to_string());
            args.push(format!("ConnectTimeout={timeout}"));
        }
        for option in &self.extra_options {
            args.push("-o".to_string());
            args.push(option.clone());
        }
        if let Some(key) = &self.key_file {
            args.push("-i".to_string());
            args.push(key.display().to_string());
        }
        args
    }
}

pub struct SshSession {
    host: RemoteHost,
    options: SshOptions,
}

impl SshSession {
    pub fn new(host: RemoteHost, options: SshOptions) -> Self {
        Self { host, options }
    }

    pub fn ssh_command(&self, remote_command: &str, tty: bool) -> Command {
        let mut cmd = Command::new("ssh");
        cmd.args(self.options.common_args());
        if tty {
            cmd.arg("-t");
        }
        if let Some(port) = self.host.port {
            cmd.arg("-p").arg(port.to_string());
        }
        cmd.arg(self.host.destination()).arg(remote_command);
        cmd
    }

    pub fn scp_command(&self, local: &Path, remote: &str) -> Command {
        let mut cmd = Command::new("scp");
        cmd.args(self.options.common_args());
        if let Some(port) = self.host.port {
            cmd.arg("-P").arg(port.to_string());
        }
        cmd.arg("-q").arg(local).arg(self.scp_destination(remote));
        cmd
    }

    fn scp_destination(&self, remote: &str) -> String {
        let address = if self.host.address.contains(':') {
            format!("[{}]", self.host.address)
        } else {
            self.host.address.clone()
        };
        match &self.host.user {
            Some(user) => format!("{user}@{address}:{remote}"),
            None => format!("{address}:{remote}"),
        }
    }

    async fn copy(&self, local: &Path, remote: &str) -> Result<()> {
        let mut cmd = self.scp_command(local, remote);
        debug!("Running scp: {:?}", cmd);

        let output = cmd.output().await.map_err(|e| DeployError::TransferFailed {
            host: self.host.to_string(),
            local: local.to_path_buf(),
            remote: remote.to_string(),
            reason: format!("Failed to execute scp: {e}"),
        })?;

        if !output.status.success() {
            return Err(DeployError::TransferFailed {
                host: self.host.to_string(),
                local: local.to_path_buf(),
                remote: remote.to_string(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteSession for SshSession {
    fn host(&self) -> &RemoteHost {
        &self.host
    }

    async fn run(&self, command: &str, options: RunOptions) -> Result<CommandResult> {
        let command = options.render(command);
        info!("[{}] run: {}", self.host, command);

        let output = self
            .ssh_command(&command, false)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| DeployError::RemoteCommandFailed {
                host: self.host.to_string(),
                command: command.clone(),
                exit_code: -1,
                stderr: format!("Failed to execute ssh: {e}"),
            })?;

        let result = CommandResult {
            success: output.status.success(),
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };
        if !result.stdout.is_empty() {
            debug!("[{}] out: {}", self.host, result.stdout.trim_end());
        }

        result.check(&self.host, &command, options.warn_only)
    }

    async fn stream(&self, command: &str, options: RunOptions) -> Result<()> {
        let command = options.render(command);
        info!("[{}] run: {}", self.host, command);

        // A pty lets the remote side see the hangup when we go away.
        let tty = std::io::stdin().is_terminal();
        let mut child = self
            .ssh_command(&command, tty)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| DeployError::RemoteCommandFailed {
                host: self.host.to_string(),
                command: command.clone(),
                exit_code: -1,
                stderr: format!("Failed to execute ssh: {e}"),
            })?;

        let status = tokio::select! {
            status = child.wait() => status?,
            _ = tokio::signal::ctrl_c() => {
                debug!("Interrupted, closing session to {}", self.host);
                child.kill().await?;
                return Ok(());
            }
        };

        let result = CommandResult {
            success: status.success(),
            exit_code: status.code().unwrap_or(-1),
            stdout: String::new(),
            stderr: String::new(),
        };
        result
            .check(&self.host, &command, options.warn_only)
            .map(|_| ())
    }

    async fn put(&self, local: &Path, remote: &str, options: PutOptions) -> Result<()> {
        info!("[{}] put: {} -> {}", self.host, local.display(), remote);

        if !options.use_sudo {
            return self.copy(local, remote).await;
        }

        // Upload as the login user, then move into place with root rights.
        let staging = staging_path();
        self.copy(local, &staging).await?;

        let (mv, cleanup) = staged_move(&staging, remote);
        if let Err(e) = self.run(&mv, RunOptions::sudo()).await {
            if let Err(cleanup_err) = self.run(&cleanup, RunOptions::default().warn_only()).await {
                warn!("Could not remove {} on {}: {}", staging, self.host, cleanup_err);
            }
            return Err(e);
        }
        Ok(())
    }
}

fn staging_path() -> String {
    format!("/tmp/svc-deploy-{}", uuid::Uuid::new_v4())
}

/// The move that installs a staged upload and the removal run if it fails.
fn staged_move(staging: &str, remote: &str) -> (String, String) {
    (
        format!("mv {} {}", quote(staging), quote(remote)),
        format!("rm -f {}", quote(staging)),
    )
}
