use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("Failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid host '{input}': {reason}")]
    InvalidHost { input: String, reason: String },

    #[error("Cross-compilation not supported for target: {os}/{arch}")]
    UnsupportedTarget { os: String, arch: String },

    #[error("Compilation failed for target {target}: {reason}")]
    BuildFailed { target: String, reason: String },

    #[error("Required file not found: {path}")]
    ArtifactMissing { path: PathBuf },

    #[error("Command failed on {host} (exit code {exit_code}): {command}: {stderr}")]
    RemoteCommandFailed {
        host: String,
        command: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("Transfer of {local} to {host}:{remote} failed: {reason}")]
    TransferFailed {
        host: String,
        local: PathBuf,
        remote: String,
        reason: String,
    },

    #[error("Binary verification failed on {host}: expected {expected}, got {actual}")]
    VerificationFailed {
        host: String,
        expected: String,
        actual: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DeployError>;
