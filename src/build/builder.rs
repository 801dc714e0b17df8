//! Local cross-compilation of the service binary

use crate::build::{BuildBackend, BuildProfile, BuildTarget};
use crate::config::DeployConfig;
use crate::deploy::{calculate_file_checksum, DeployError, Result};
use std::path::PathBuf;
use std::time::Instant;
use tokio::process::Command;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub target: BuildTarget,
    /// File name of the artifact under `build/<os>/<arch>/`.
    pub binary: String,
}

#[derive(Debug, Clone)]
pub struct BuiltArtifact {
    pub target: BuildTarget,
    pub path: PathBuf,
    pub size: u64,
    pub checksum: String,
}

#[derive(Debug, Clone)]
pub struct BinaryBuilder {
    project_dir: PathBuf,
    output_dir: PathBuf,
    cargo_bin: String,
    backend: BuildBackend,
    profile: BuildProfile,
    features: Vec<String>,
}

impl BinaryBuilder {
    pub fn new(config: &DeployConfig) -> Self {
        Self {
            project_dir: config.build.project_dir.clone(),
            output_dir: config.build.output_dir.clone(),
            cargo_bin: config.cargo_bin().to_string(),
            backend: config.build.backend,
            profile: config.build.profile,
            features: config.build.features.clone(),
        }
    }

    pub fn artifact_path(&self, request: &BuildRequest) -> PathBuf {
        request.target.artifact_path(&self.output_dir, &request.binary)
    }

    pub async fn build(&self, request: &BuildRequest) -> Result<BuiltArtifact> {
        let start_time = Instant::now();
        let backend = self.resolve_backend(&request.target)?;

        info!(
            "Building {} for {} ({}) with {:?}",
            self.cargo_bin,
            request.target,
            request.target.target_triple(),
            backend
        );

        let mut cmd = self.build_command(&request.target, backend);
        debug!("Running build command: {:?}", cmd);

        let output = cmd.output().await.map_err(|e| DeployError::BuildFailed {
            target: request.target.to_string(),
            reason: format!("Failed to execute cargo: {e}"),
        })?;

        if !output.status.success() {
            return Err(DeployError::BuildFailed {
                target: request.target.to_string(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let artifact = self.collect_artifact(request).await?;
        info!(
            "Built {} ({} bytes) in {:?}",
            artifact.path.display(),
            artifact.size,
            start_time.elapsed()
        );
        Ok(artifact)
    }

    /// Copies the compiled binary into `build/<os>/<arch>/` and hashes it.
    pub async fn collect_artifact(&self, request: &BuildRequest) -> Result<BuiltArtifact> {
        let compiled = self.compiled_binary_path(&request.target);
        if !compiled.is_file() {
            return Err(DeployError::ArtifactMissing { path: compiled });
        }

        let artifact_path = self.artifact_path(request);
        if let Some(parent) = artifact_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let size = tokio::fs::copy(&compiled, &artifact_path).await?;
        let checksum = calculate_file_checksum(&artifact_path).await?;

        Ok(BuiltArtifact {
            target: request.target.clone(),
            path: artifact_path,
            size,
            checksum,
        })
    }

    pub fn resolve_backend(&self, target: &BuildTarget) -> Result<BuildBackend> {
        match self.backend {
            BuildBackend::Cargo => Ok(BuildBackend::Cargo),
            BuildBackend::Zigbuild => {
                if zigbuild_available() {
                    Ok(BuildBackend::Zigbuild)
                } else {
                    Err(DeployError::BuildFailed {
                        target: target.to_string(),
                        reason: "cargo-zigbuild is not installed".to_string(),
                    })
                }
            }
            BuildBackend::Auto => {
                let native = BuildTarget::host().as_ref() == Some(target);
                if !native && zigbuild_available() {
                    Ok(BuildBackend::Zigbuild)
                } else {
                    Ok(BuildBackend::Cargo)
                }
            }
        }
    }

    pub fn build_command(&self, target: &BuildTarget, backend: BuildBackend) -> Command {
        let mut cmd = Command::new("cargo");
        match backend {
            BuildBackend::Zigbuild => cmd.arg("zigbuild"),
            BuildBackend::Cargo | BuildBackend::Auto => cmd.arg("build"),
        };

        if self.profile == BuildProfile::Release {
            cmd.arg("--release");
        }
        cmd.args(["--target", target.target_triple()]);
        cmd.args(["--bin", self.cargo_bin.as_str()]);

        if !self.features.is_empty() {
            let features = self.features.join(",");
            cmd.args(["--features", features.as_str()]);
        }

        cmd.current_dir(&self.project_dir);
        cmd
    }

    /// Where cargo leaves the binary, honouring `CARGO_TARGET_DIR`.
    pub fn compiled_binary_path(&self, target: &BuildTarget) -> PathBuf {
        let target_dir = std::env::var_os("CARGO_TARGET_DIR")
            .map(PathBuf::from)
            .map(|dir| {
                if dir.is_absolute() {
                    dir
                } else {
                    self.project_dir.join(dir)
                }
            })
            .unwrap_or_else(|| self.project_dir.join("target"));

        target_dir
            .join(target.target_triple())
            .join(self.profile.target_subdir())
            .join(target.binary_file_name(&self.cargo_bin))
    }
}

fn zigbuild_available() -> bool {
    which::which("cargo-zigbuild").is_ok()
}
