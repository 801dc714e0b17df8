use crate::deploy::{DeployError, Result};
use std::fmt;
use std::path::{Path, PathBuf};

/// Operating system and architecture pair, named the way artifact
/// directories are laid out (`build/<os>/<arch>/<binary>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BuildTarget {
    pub os: String,
    pub arch: String,
}

impl BuildTarget {
    /// Normalises aliases (`macos`, `x86_64`, `aarch64`, ...) and rejects
    /// combinations without a known Rust target triple.
    pub fn new(os: &str, arch: &str) -> Result<Self> {
        let unsupported = || DeployError::UnsupportedTarget {
            os: os.to_string(),
            arch: arch.to_string(),
        };

        let os = normalize_os(os).ok_or_else(unsupported)?;
        let arch = normalize_arch(arch).ok_or_else(unsupported)?;
        let target = Self {
            os: os.to_string(),
            arch: arch.to_string(),
        };

        if target.lookup_triple().is_none() {
            return Err(unsupported());
        }
        Ok(target)
    }

    pub fn linux_amd64() -> Self {
        Self {
            os: "linux".to_string(),
            arch: "amd64".to_string(),
        }
    }

    /// Target of the machine running this tool, if it has a known triple.
    pub fn host() -> Option<Self> {
        Self::new(std::env::consts::OS, std::env::consts::ARCH).ok()
    }

    pub fn target_triple(&self) -> &'static str {
        // Construction through `new` guarantees a triple exists.
        self.lookup_triple().unwrap_or("unknown")
    }

    fn lookup_triple(&self) -> Option<&'static str> {
        let triple = match (self.os.as_str(), self.arch.as_str()) {
            ("linux", "amd64") => "x86_64-unknown-linux-gnu",
            ("linux", "arm64") => "aarch64-unknown-linux-gnu",
            ("linux", "386") => "i686-unknown-linux-gnu",
            ("linux", "arm") => "armv7-unknown-linux-gnueabihf",
            ("darwin", "amd64") => "x86_64-apple-darwin",
            ("darwin", "arm64") => "aarch64-apple-darwin",
            ("windows", "amd64") => "x86_64-pc-windows-gnu",
            ("windows", "386") => "i686-pc-windows-gnu",
            ("freebsd", "amd64") => "x86_64-unknown-freebsd",
            _ => return None,
        };
        Some(triple)
    }

    pub fn binary_file_name(&self, binary: &str) -> String {
        if self.os == "windows" {
            format!("{binary}.exe")
        } else {
            binary.to_string()
        }
    }

    /// `<output_dir>/<os>/<arch>/<binary>`
    pub fn artifact_path(&self, output_dir: &Path, binary: &str) -> PathBuf {
        self.artifact_dir(output_dir)
            .join(self.binary_file_name(binary))
    }

    pub fn artifact_dir(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(&self.os).join(&self.arch)
    }
}

impl fmt::Display for BuildTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}

fn normalize_os(os: &str) -> Option<&'static str> {
    match os.to_ascii_lowercase().as_str() {
        "linux" => Some("linux"),
        "darwin" | "macos" | "osx" => Some("darwin"),
        "windows" | "win" => Some("windows"),
        "freebsd" => Some("freebsd"),
        _ => None,
    }
}

fn normalize_arch(arch: &str) -> Option<&'static str> {
    match arch.to_ascii_lowercase().as_str() {
        "amd64" | "x86_64" | "x64" => Some("amd64"),
        "arm64" | "aarch64" => Some("arm64"),
        "386" | "i386" | "i686" | "x86" => Some("386"),
        "arm" | "armv7" => Some("arm"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_path_layout() {
        let target = BuildTarget::new("darwin", "amd64").unwrap();
        assert_eq!(
            target.artifact_path(Path::new("build"), "gamehealthysrv"),
            PathBuf::from("build/darwin/amd64/gamehealthysrv")
        );
    }

    #[test]
    fn test_windows_artifact_has_exe_suffix() {
        let target = BuildTarget::new("windows", "amd64").unwrap();
        assert_eq!(
            target.artifact_path(Path::new("build"), "app"),
            PathBuf::from("build/windows/amd64/app.exe")
        );
    }

    #[test]
    fn test_aliases_normalize() {
        let target = BuildTarget::new("macos", "aarch64").unwrap();
        assert_eq!(target.os, "darwin");
        assert_eq!(target.arch, "arm64");
        assert_eq!(target.target_triple(), "aarch64-apple-darwin");
        assert_eq!(target.to_string(), "darwin/arm64");
    }

    #[test]
    fn test_linux_triples() {
        assert_eq!(
            BuildTarget::linux_amd64().target_triple(),
            "x86_64-unknown-linux-gnu"
        );
        assert_eq!(
            BuildTarget::new("linux", "arm64").unwrap().target_triple(),
            "aarch64-unknown-linux-gnu"
        );
    }

    #[test]
    fn test_unsupported_combinations() {
        assert!(matches!(
            BuildTarget::new("plan9", "amd64"),
            Err(DeployError::UnsupportedTarget { .. })
        ));
        assert!(BuildTarget::new("darwin", "386").is_err());
        assert!(BuildTarget::new("linux", "mips").is_err());
    }
}
