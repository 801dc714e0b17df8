use crate::config::DEFAULT_CONFIG_FILE;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Main svc-deploy CLI interface
#[derive(Debug, Parser)]
#[command(name = "svc-deploy")]
#[command(about = "Build a service binary, ship it over SSH and control it through systemd")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct SvcDeployCli {
    #[command(subcommand)]
    pub command: Commands,

    /// Deployment configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Remote host as [user@]address[:port], replaces the configured hosts
    #[arg(long = "host", global = true)]
    pub hosts: Vec<String>,

    /// SSH private key, replaces the configured key
    #[arg(short = 'i', long, global = true)]
    pub key: Option<PathBuf>,

    /// Enable verbose output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Print what would be executed without touching any host
    #[arg(long, global = true)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Cross-compile the service binary into build/<os>/<arch>/<binary>
    Build {
        /// Target operating system (linux, darwin, windows, freebsd)
        #[arg(long, default_value = "darwin")]
        os: String,
        /// Target architecture (amd64, arm64, 386, arm)
        #[arg(long, default_value = "amd64")]
        arch: String,
        /// Artifact file name, the configured binary name by default
        #[arg(long)]
        binary: Option<String>,
    },

    /// Create the service user and remote directories
    #[command(alias = "preDeploy")]
    PreDeploy,

    /// Upload binary, configuration and unit file, then enable the unit
    Deploy,

    /// Reload systemd and restart the service
    Start,

    /// Stop the service
    Stop,

    /// Show systemd status of the service
    Status,

    /// Show the service journal
    Log {
        /// Number of journal lines to show
        #[arg(short = 'n', long, default_value_t = 20)]
        lines: u32,
        /// Print the lines once instead of following the journal
        #[arg(long)]
        no_tail: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        SvcDeployCli::command().debug_assert();
    }

    #[test]
    fn test_log_defaults_follow_twenty_lines() {
        let cli = SvcDeployCli::parse_from(["svc-deploy", "log"]);
        assert!(matches!(
            cli.command,
            Commands::Log {
                lines: 20,
                no_tail: false
            }
        ));
        assert_eq!(cli.config, PathBuf::from("svc-deploy.yaml"));
    }

    #[test]
    fn test_log_one_shot() {
        let cli = SvcDeployCli::parse_from(["svc-deploy", "log", "-n", "100", "--no-tail"]);
        assert!(matches!(
            cli.command,
            Commands::Log {
                lines: 100,
                no_tail: true
            }
        ));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = SvcDeployCli::parse_from([
            "svc-deploy",
            "deploy",
            "--host",
            "a@10.0.0.1",
            "--host",
            "b@10.0.0.2",
            "-i",
            "~/.ssh/id_elastic",
            "--dry-run",
            "-vv",
        ]);
        assert_eq!(cli.hosts, vec!["a@10.0.0.1", "b@10.0.0.2"]);
        assert_eq!(cli.key, Some(PathBuf::from("~/.ssh/id_elastic")));
        assert!(cli.dry_run);
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Deploy));
    }

    #[test]
    fn test_build_defaults_and_alias() {
        let cli = SvcDeployCli::parse_from(["svc-deploy", "build"]);
        match cli.command {
            Commands::Build { os, arch, binary } => {
                assert_eq!(os, "darwin");
                assert_eq!(arch, "amd64");
                assert_eq!(binary, None);
            }
            other => panic!("Expected build, got {other:?}"),
        }

        let cli = SvcDeployCli::parse_from(["svc-deploy", "preDeploy"]);
        assert!(matches!(cli.command, Commands::PreDeploy));
    }
}
