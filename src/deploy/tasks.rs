//! The remote task surface: provisioning, shipping and service control

use crate::config::{DeployConfig, ServiceLayout};
use crate::deploy::checksum::parse_sha256sum_output;
use crate::deploy::{calculate_file_checksum, DeployError, Result};
use crate::remote::{quote, PutOptions, RemoteSession, RunOptions};
use crate::service::Systemd;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One remote operation, as selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteTask {
    PreDeploy,
    Deploy,
    Start,
    Stop,
    Status,
    Log { lines: u32, follow: bool },
}

impl RemoteTask {
    pub fn name(&self) -> &'static str {
        match self {
            RemoteTask::PreDeploy => "pre-deploy",
            RemoteTask::Deploy => "deploy",
            RemoteTask::Start => "start",
            RemoteTask::Stop => "stop",
            RemoteTask::Status => "status",
            RemoteTask::Log { .. } => "log",
        }
    }
}

pub struct Tasks<S> {
    session: S,
    layout: ServiceLayout,
    systemd: Systemd,
    artifact: PathBuf,
    unit_file: PathBuf,
    config_files: Vec<PathBuf>,
    verify_checksum: bool,
}

impl<S: RemoteSession> Tasks<S> {
    pub fn new(config: &DeployConfig, session: S) -> Result<Self> {
        let layout = config.layout();
        let artifact = config
            .deploy_target()?
            .artifact_path(&config.build.output_dir, &config.service.binary);

        Ok(Self {
            session,
            systemd: Systemd::new(layout.unit_name.clone()),
            layout,
            artifact,
            unit_file: config.service.unit_file(),
            config_files: config.service.config_files.clone(),
            verify_checksum: config.deploy.verify_checksum,
        })
    }

    /// Disables the post-upload checksum comparison.
    pub fn without_verification(mut self) -> Self {
        self.verify_checksum = false;
        self
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    /// Local binary that `deploy` ships.
    pub fn artifact(&self) -> &Path {
        &self.artifact
    }

    pub async fn execute(&self, task: RemoteTask) -> Result<()> {
        info!("Running {} on {}", task.name(), self.session.host());
        match task {
            RemoteTask::PreDeploy => self.pre_deploy().await,
            RemoteTask::Deploy => self.deploy().await,
            RemoteTask::Start => self.start().await,
            RemoteTask::Stop => self.stop().await,
            RemoteTask::Status => self.status().await,
            RemoteTask::Log { lines, follow } => self.log(lines, follow).await,
        }
    }

    /// Creates the service account and the directories it owns.
    pub async fn pre_deploy(&self) -> Result<()> {
        // The account usually exists after the first deploy.
        self.sudo_warn_only(&format!("adduser -U {}", self.layout.user))
            .await?;

        let owner = self.layout.owner();
        for dir in self.layout.directories() {
            self.sudo(&format!("mkdir -p {}", quote(dir))).await?;
            self.sudo(&format!("chown {owner} {}", quote(dir))).await?;
        }
        Ok(())
    }

    pub async fn deploy(&self) -> Result<()> {
        self.check_local_files()?;
        self.pre_deploy().await?;

        let remote_binary = self.layout.remote_binary();
        self.session
            .put(&self.artifact, &remote_binary, PutOptions::sudo())
            .await?;
        self.sudo(&format!("chmod u+x {}", quote(&remote_binary)))
            .await?;
        self.sudo(&format!(
            "chown {} {}",
            self.layout.owner(),
            quote(&remote_binary)
        ))
        .await?;

        if self.verify_checksum {
            self.verify_binary(&remote_binary).await?;
        }

        for file in &self.config_files {
            let remote = remote_path_in(&self.layout.conf_dir, file)?;
            self.session.put(file, &remote, PutOptions::sudo()).await?;
        }

        self.session
            .put(&self.unit_file, &self.layout.unit_path, PutOptions::sudo())
            .await?;
        self.sudo(&self.systemd.enable()).await?;

        info!(
            "Deployed {} to {}",
            self.layout.unit_name,
            self.session.host()
        );
        Ok(())
    }

    /// Reloads unit files and (re)starts the service.
    pub async fn start(&self) -> Result<()> {
        self.sudo(&self.systemd.daemon_reload()).await?;
        self.sudo(&self.systemd.restart()).await
    }

    pub async fn stop(&self) -> Result<()> {
        self.sudo(&self.systemd.stop()).await
    }

    pub async fn status(&self) -> Result<()> {
        self.session
            .stream(&self.systemd.status(), RunOptions::sudo())
            .await
    }

    /// Shows the last `lines` journal entries, following new ones when
    /// `follow` is set.
    pub async fn log(&self, lines: u32, follow: bool) -> Result<()> {
        let result = self
            .session
            .stream(&self.systemd.journal(lines, follow), RunOptions::sudo())
            .await;

        match result {
            Err(e) if follow && ended_by_interrupt(&e) => {
                info!("Stopped following the journal on {}", self.session.host());
                Ok(())
            }
            other => other,
        }
    }

    fn check_local_files(&self) -> Result<()> {
        std::iter::once(&self.artifact)
            .chain(&self.config_files)
            .chain(std::iter::once(&self.unit_file))
            .find(|path| !path.is_file())
            .map_or(Ok(()), |missing| {
                Err(DeployError::ArtifactMissing {
                    path: missing.clone(),
                })
            })
    }

    async fn verify_binary(&self, remote_binary: &str) -> Result<()> {
        let expected = calculate_file_checksum(&self.artifact).await?;
        let result = self
            .session
            .run(
                &format!("sha256sum {}", quote(remote_binary)),
                RunOptions::sudo(),
            )
            .await?;

        let actual = parse_sha256sum_output(&result.stdout).unwrap_or_default();
        if actual != expected {
            return Err(DeployError::VerificationFailed {
                host: self.session.host().to_string(),
                expected,
                actual: actual.to_string(),
            });
        }

        debug!("Binary integrity verified on {}", self.session.host());
        Ok(())
    }

    async fn sudo(&self, command: &str) -> Result<()> {
        self.session.run(command, RunOptions::sudo()).await.map(|_| ())
    }

    async fn sudo_warn_only(&self, command: &str) -> Result<()> {
        self.session
            .run(command, RunOptions::sudo().warn_only())
            .await
            .map(|_| ())
    }
}

/// Ctrl-C under a pty reaches the remote journalctl instead of us. The
/// remote shell then reports 130, or ssh exits 255 when the command died
/// from the signal itself.
fn ended_by_interrupt(err: &DeployError) -> bool {
    matches!(
        err,
        DeployError::RemoteCommandFailed {
            exit_code: 130 | 255,
            ..
        }
    )
}

fn remote_path_in(dir: &str, local: &Path) -> Result<String> {
    let name = local
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            DeployError::Configuration(format!(
                "config file '{}' has no usable file name",
                local.display()
            ))
        })?;
    Ok(crate::config::layout::join_remote(dir, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{CommandResult, RecordedOp, RecordingSession};

    fn tasks(yaml: &str) -> Tasks<RecordingSession> {
        let config = DeployConfig::from_yaml_str(yaml).unwrap();
        let session = RecordingSession::new("tonnn@115.159.101.234".parse().unwrap());
        Tasks::new(&config, session).unwrap()
    }

    const CONFIG: &str = "service:\n  binary: gamehealthysrv\n  user: gamesms\n";

    #[tokio::test]
    async fn test_pre_deploy_sequence() {
        let tasks = tasks(CONFIG);
        tasks.pre_deploy().await.unwrap();

        assert_eq!(
            tasks.session().commands(),
            vec![
                "sudo adduser -U gamesms",
                "sudo mkdir -p /data/gamehealthysrv/bin",
                "sudo chown gamesms:gamesms /data/gamehealthysrv/bin",
                "sudo mkdir -p /data/gamehealthysrv/configs",
                "sudo chown gamesms:gamesms /data/gamehealthysrv/configs",
            ]
        );
        assert!(matches!(
            tasks.session().ops()[0],
            RecordedOp::Run {
                warn_only: true,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_existing_user_does_not_abort() {
        let config = DeployConfig::from_yaml_str(CONFIG).unwrap();
        let session = RecordingSession::new("host".parse().unwrap()).with_response(
            "sudo adduser",
            CommandResult::failed(1, "adduser: user 'gamesms' already exists"),
        );
        let tasks = Tasks::new(&config, session).unwrap();

        tasks.pre_deploy().await.unwrap();
        assert_eq!(tasks.session().commands().len(), 5);
    }

    #[tokio::test]
    async fn test_failed_mkdir_aborts() {
        let config = DeployConfig::from_yaml_str(CONFIG).unwrap();
        let session = RecordingSession::new("host".parse().unwrap())
            .with_response("sudo mkdir", CommandResult::failed(1, "read-only file system"));
        let tasks = Tasks::new(&config, session).unwrap();

        let err = tasks.pre_deploy().await.unwrap_err();
        assert!(matches!(err, DeployError::RemoteCommandFailed { .. }));
        assert_eq!(tasks.session().commands().len(), 2);
    }

    #[tokio::test]
    async fn test_start_stop_status() {
        let tasks = tasks(CONFIG);
        tasks.start().await.unwrap();
        tasks.stop().await.unwrap();
        tasks.status().await.unwrap();

        assert_eq!(
            tasks.session().commands(),
            vec![
                "sudo systemctl daemon-reload",
                "sudo systemctl restart gamehealthysrv.service",
                "sudo systemctl stop gamehealthysrv.service",
                "sudo systemctl status gamehealthysrv.service",
            ]
        );
    }

    #[tokio::test]
    async fn test_log_modes() {
        let tasks = tasks(CONFIG);
        tasks
            .execute(RemoteTask::Log {
                lines: 20,
                follow: true,
            })
            .await
            .unwrap();
        tasks
            .execute(RemoteTask::Log {
                lines: 50,
                follow: false,
            })
            .await
            .unwrap();

        assert_eq!(
            tasks.session().commands(),
            vec![
                "sudo journalctl -f -l -n 20 -u gamehealthysrv.service",
                "sudo journalctl -l -n 50 -u gamehealthysrv.service",
            ]
        );
    }

    fn interrupted(exit_code: i32) -> Tasks<RecordingSession> {
        let config = DeployConfig::from_yaml_str(CONFIG).unwrap();
        let session = RecordingSession::new("host".parse().unwrap())
            .with_response("sudo journalctl", CommandResult::failed(exit_code, ""));
        Tasks::new(&config, session).unwrap()
    }

    #[tokio::test]
    async fn test_interrupted_follow_ends_cleanly() {
        interrupted(130).log(20, true).await.unwrap();
        interrupted(255).log(20, true).await.unwrap();
    }

    #[tokio::test]
    async fn test_interrupt_codes_fail_one_shot_log() {
        let err = interrupted(130).log(20, false).await.unwrap_err();
        assert!(matches!(
            err,
            DeployError::RemoteCommandFailed { exit_code: 130, .. }
        ));
    }

    #[tokio::test]
    async fn test_follow_still_reports_other_failures() {
        let err = interrupted(1).log(20, true).await.unwrap_err();
        assert!(matches!(
            err,
            DeployError::RemoteCommandFailed { exit_code: 1, .. }
        ));
    }

    #[tokio::test]
    async fn test_status_is_not_treated_as_interrupted() {
        let config = DeployConfig::from_yaml_str(CONFIG).unwrap();
        let session = RecordingSession::new("host".parse().unwrap())
            .with_response("sudo systemctl status", CommandResult::failed(255, ""));
        let tasks = Tasks::new(&config, session).unwrap();
        assert!(tasks.status().await.is_err());
    }

    #[tokio::test]
    async fn test_deploy_refuses_without_artifact() {
        let tasks = tasks("service:\n  binary: missing-bin\nbuild:\n  output_dir: /nonexistent\n");
        let err = tasks.deploy().await.unwrap_err();

        match err {
            DeployError::ArtifactMissing { path } => {
                assert_eq!(path, PathBuf::from("/nonexistent/linux/amd64/missing-bin"));
            }
            other => panic!("Expected ArtifactMissing, got {other:?}"),
        }
        assert!(tasks.session().ops().is_empty());
    }

    #[test]
    fn test_remote_path_in() {
        assert_eq!(
            remote_path_in("/data/app/configs", Path::new("configs/remote/app.json")).unwrap(),
            "/data/app/configs/app.json"
        );
    }

    #[test]
    fn test_task_names() {
        assert_eq!(RemoteTask::PreDeploy.name(), "pre-deploy");
        assert_eq!(
            RemoteTask::Log {
                lines: 1,
                follow: false
            }
            .name(),
            "log"
        );
    }
}
