use crate::build::{BinaryBuilder, BuildRequest, BuildTarget};
use crate::cli::options::{Commands, SvcDeployCli};
use crate::cli::output::{
    print_build_plan, print_build_summary, print_dry_run_banner, print_task_header,
};
use crate::config::DeployConfig;
use crate::deploy::{RemoteTask, Result, Tasks};
use crate::remote::{RecordingSession, RemoteSession, SshOptions, SshSession};
use tracing::{debug, info};

/// Loads the configuration named on the command line and applies overrides.
pub fn load_config(cli: &SvcDeployCli) -> Result<DeployConfig> {
    let mut config = DeployConfig::load(&cli.config)?;
    config.apply_overrides(&cli.hosts, cli.key.clone());
    Ok(config)
}

pub async fn run_command(cli: &SvcDeployCli, config: &DeployConfig) -> Result<()> {
    match &cli.command {
        Commands::Build { os, arch, binary } => {
            let request = BuildRequest {
                target: BuildTarget::new(os, arch)?,
                binary: binary
                    .clone()
                    .unwrap_or_else(|| config.service.binary.clone()),
            };
            run_build(config, &request, cli.dry_run).await
        }
        Commands::PreDeploy => run_remote_task(config, RemoteTask::PreDeploy, cli.dry_run).await,
        Commands::Deploy => run_remote_task(config, RemoteTask::Deploy, cli.dry_run).await,
        Commands::Start => run_remote_task(config, RemoteTask::Start, cli.dry_run).await,
        Commands::Stop => run_remote_task(config, RemoteTask::Stop, cli.dry_run).await,
        Commands::Status => run_remote_task(config, RemoteTask::Status, cli.dry_run).await,
        Commands::Log { lines, no_tail } => {
            let task = RemoteTask::Log {
                lines: *lines,
                follow: !*no_tail,
            };
            run_remote_task(config, task, cli.dry_run).await
        }
    }
}

pub async fn run_build(config: &DeployConfig, request: &BuildRequest, dry_run: bool) -> Result<()> {
    let builder = BinaryBuilder::new(config);

    if dry_run {
        let backend = builder.resolve_backend(&request.target)?;
        let cmd = builder.build_command(&request.target, backend);
        print_build_plan(&format!("{:?}", cmd.as_std()), &builder.artifact_path(request));
        return Ok(());
    }

    let artifact = builder.build(request).await?;
    print_build_summary(&artifact);
    Ok(())
}

/// Runs `task` host by host in configuration order; the first failure stops
/// the run.
pub async fn run_remote_task(config: &DeployConfig, task: RemoteTask, dry_run: bool) -> Result<()> {
    let hosts = config.remote_hosts()?;
    debug!("Running {} against {} host(s)", task.name(), hosts.len());

    if dry_run {
        print_dry_run_banner(task, &hosts);
        for host in hosts {
            let session = RecordingSession::new(host).echoing();
            let tasks = Tasks::new(config, session)?.without_verification();
            run_on_host(&tasks, task).await?;
        }
        return Ok(());
    }

    let ssh_options = SshOptions::from_config(config);
    for host in hosts {
        let session = SshSession::new(host, ssh_options.clone());
        let tasks = Tasks::new(config, session)?;
        run_on_host(&tasks, task).await?;
    }

    info!("{} finished", task.name());
    Ok(())
}

async fn run_on_host<S: RemoteSession>(tasks: &Tasks<S>, task: RemoteTask) -> Result<()> {
    print_task_header(task, tasks.session().host());
    tasks.execute(task).await
}
