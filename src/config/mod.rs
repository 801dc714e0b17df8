//! Deployment configuration loaded from `svc-deploy.yaml`

pub mod host;
pub mod layout;

pub use host::RemoteHost;
pub use layout::ServiceLayout;

use crate::build::{BuildBackend, BuildProfile, BuildTarget};
use crate::deploy::{DeployError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_CONFIG_FILE: &str = "svc-deploy.yaml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployConfig {
    #[serde(default)]
    pub hosts: Vec<String>,
    #[serde(default)]
    pub ssh: SshConfig,
    pub service: ServiceConfig,
    #[serde(default)]
    pub build: BuildConfig,
    #[serde(default)]
    pub deploy: DeploySettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SshConfig {
    pub key_file: Option<PathBuf>,
    #[serde(default = "default_host_key_checking")]
    pub strict_host_key_checking: String,
    pub connect_timeout_secs: Option<u64>,
    #[serde(default)]
    pub options: Vec<String>,
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            key_file: None,
            strict_host_key_checking: default_host_key_checking(),
            connect_timeout_secs: None,
            options: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Name of the binary, also used as the data directory name.
    pub binary: String,
    /// systemd unit name, `<binary>.service` when unset.
    pub name: Option<String>,
    pub user: Option<String>,
    pub group: Option<String>,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_unit_dir")]
    pub unit_dir: String,
    /// Local unit file, `./<unit name>` when unset.
    pub unit_file: Option<PathBuf>,
    #[serde(default)]
    pub config_files: Vec<PathBuf>,
}

impl ServiceConfig {
    pub fn unit_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("{}.service", self.binary))
    }

    pub fn user(&self) -> &str {
        self.user.as_deref().unwrap_or(&self.binary)
    }

    pub fn group(&self) -> &str {
        self.group.as_deref().unwrap_or_else(|| self.user())
    }

    pub fn unit_file(&self) -> PathBuf {
        self.unit_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(self.unit_name()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    #[serde(default = "default_project_dir")]
    pub project_dir: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Cargo `--bin` target, the service binary name when unset.
    pub cargo_bin: Option<String>,
    #[serde(default)]
    pub backend: BuildBackend,
    #[serde(default)]
    pub profile: BuildProfile,
    #[serde(default)]
    pub features: Vec<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            project_dir: default_project_dir(),
            output_dir: default_output_dir(),
            cargo_bin: None,
            backend: BuildBackend::default(),
            profile: BuildProfile::default(),
            features: Vec::new(),
        }
    }
}

/// Which artifact `deploy` ships.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploySettings {
    #[serde(default = "default_os")]
    pub os: String,
    #[serde(default = "default_arch")]
    pub arch: String,
    #[serde(default = "default_true")]
    pub verify_checksum: bool,
}

impl Default for DeploySettings {
    fn default() -> Self {
        Self {
            os: default_os(),
            arch: default_arch(),
            verify_checksum: true,
        }
    }
}

impl DeployConfig {
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|source| DeployError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: DeployConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let binary = &self.service.binary;
        if binary.trim().is_empty() {
            return Err(DeployError::Configuration(
                "service.binary must not be empty".to_string(),
            ));
        }
        if binary.contains('/') || binary.chars().any(char::is_whitespace) {
            return Err(DeployError::Configuration(format!(
                "service.binary '{binary}' must be a plain file name"
            )));
        }
        if self.service.unit_name().contains('/') {
            return Err(DeployError::Configuration(format!(
                "service.name '{}' must be a plain unit name",
                self.service.unit_name()
            )));
        }
        for account in [self.service.user(), self.service.group()] {
            if !is_account_name(account) {
                return Err(DeployError::Configuration(format!(
                    "'{account}' is not a valid user or group name"
                )));
            }
        }
        for dir in [&self.service.data_dir, &self.service.unit_dir] {
            if !dir.starts_with('/') {
                return Err(DeployError::Configuration(format!(
                    "remote directory '{dir}' must be absolute"
                )));
            }
        }
        for file in &self.service.config_files {
            if file.file_name().is_none() {
                return Err(DeployError::Configuration(format!(
                    "config file '{}' has no file name",
                    file.display()
                )));
            }
        }
        // Surfaces an unknown os/arch at load time rather than mid-deploy.
        self.deploy_target()?;
        Ok(())
    }

    /// Replaces configured hosts and key with command line values.
    pub fn apply_overrides(&mut self, hosts: &[String], key_file: Option<PathBuf>) {
        if !hosts.is_empty() {
            self.hosts = hosts.to_vec();
        }
        if key_file.is_some() {
            self.ssh.key_file = key_file;
        }
    }

    pub fn remote_hosts(&self) -> Result<Vec<RemoteHost>> {
        if self.hosts.is_empty() {
            return Err(DeployError::Configuration(
                "no remote hosts configured (set `hosts` or pass --host)".to_string(),
            ));
        }
        self.hosts.iter().map(|h| h.parse()).collect()
    }

    pub fn layout(&self) -> ServiceLayout {
        ServiceLayout::new(&self.service)
    }

    pub fn deploy_target(&self) -> Result<BuildTarget> {
        BuildTarget::new(&self.deploy.os, &self.deploy.arch)
    }

    pub fn cargo_bin(&self) -> &str {
        self.build.cargo_bin.as_deref().unwrap_or(&self.service.binary)
    }

    /// Key file with a leading `~` resolved against the home directory.
    pub fn key_file(&self) -> Option<PathBuf> {
        self.ssh.key_file.as_deref().map(expand_home)
    }
}

pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}

fn is_account_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('-')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

fn default_host_key_checking() -> String {
    "accept-new".to_string()
}

fn default_data_dir() -> String {
    "/data".to_string()
}

fn default_unit_dir() -> String {
    "/usr/lib/systemd/system".to_string()
}

fn default_project_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("build")
}

fn default_os() -> String {
    "linux".to_string()
}

fn default_arch() -> String {
    "amd64".to_string()
}

fn default_true() -> bool {
    true
}
