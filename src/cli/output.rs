use crate::build::BuiltArtifact;
use crate::config::RemoteHost;
use crate::deploy::RemoteTask;
use std::path::Path;

/// Print the result of a local build
pub fn print_build_summary(artifact: &BuiltArtifact) {
    println!("✅ Built {} for {}", artifact.path.display(), artifact.target);
    println!("  • Target triple: {}", artifact.target.target_triple());
    println!("  • Size: {} bytes", artifact.size);
    println!("  • SHA-256: {}", artifact.checksum);
}

/// Print the build that would run in dry-run mode
pub fn print_build_plan(command: &str, artifact: &Path) {
    println!("🔍 DRY RUN MODE - nothing will be built");
    println!("  • Command: {command}");
    println!("  • Artifact: {}", artifact.display());
}

pub fn print_dry_run_banner(task: RemoteTask, hosts: &[RemoteHost]) {
    println!("🔍 DRY RUN MODE - no remote command will be executed");
    println!("  • Task: {}", task.name());
    println!("  • Hosts: {}", hosts.len());
    println!();
}

pub fn print_task_header(task: RemoteTask, host: &RemoteHost) {
    println!("🚀 {} @ {}", task.name(), host);
}
