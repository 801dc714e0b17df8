pub mod builder;
pub mod target;

pub use builder::{BinaryBuilder, BuildRequest, BuiltArtifact};
pub use target::BuildTarget;

use serde::{Deserialize, Serialize};

/// Compiler front-end used for a build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildBackend {
    /// `cargo zigbuild` when cross-compiling and it is installed, otherwise `cargo build`.
    #[default]
    Auto,
    Cargo,
    Zigbuild,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildProfile {
    #[default]
    Release,
    Debug,
}

impl BuildProfile {
    /// Directory cargo writes artifacts into for this profile.
    pub fn target_subdir(&self) -> &'static str {
        match self {
            BuildProfile::Release => "release",
            BuildProfile::Debug => "debug",
        }
    }
}
