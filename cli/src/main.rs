//! Metis CLI: operator entry point to the build backend.

mod output;

use anyhow::{bail, Context};
use clap::Parser;
use metis_client::BuildBackend;
use metis_console::{
    run_ticker, BuildWizard, ConsoleConfig, HistoryFeed, HostCatalog, ShutdownController,
    TaskMonitor, VmInventory, WizardStep,
};
use metis_types::{Clock, CloudPlatform, SystemClock, VmAction, WareVersion};
use metis_utils::LogFormat;
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "metis", about = "Metis build console")]
struct Cli {
    /// Base URL of the build backend.
    #[arg(long, env = "METIS_API_BASE_URL")]
    api_base_url: Option<String>,

    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "METIS_CONFIG")]
    config: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "METIS_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "METIS_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// List the versions of a project.
    Versions { project: String },

    /// Show virtualisation host capacity.
    Hosts,

    /// List the components and commits of a project version.
    Components { app: String, version: String },

    /// Submit a build request.
    Build(BuildArgs),

    /// Show build history with cleanup countdowns.
    History {
        #[arg(long, default_value = "")]
        project: String,
        #[arg(long, default_value = "")]
        version: String,
        /// Number of pages to fetch.
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },

    /// Follow cleanup countdowns live until they all expire.
    HistoryWatch {
        #[arg(long, default_value = "")]
        project: String,
        #[arg(long, default_value = "")]
        version: String,
    },

    /// Show a build's details.
    Details { deploy_id: String },

    /// Show a build's task progress.
    Task {
        deploy_id: String,
        /// Keep polling until the task settles.
        #[arg(long)]
        watch: bool,
    },

    /// Protect a build from deletion.
    Lock { deploy_id: String },

    /// Remove a build's deletion protection.
    Unlock { deploy_id: String },

    /// Delete an unlocked build.
    Delete { deploy_id: String },

    /// Stop a build's running task.
    Stop { deploy_id: String },

    /// List test VMs.
    Vms,

    /// Power a test VM on.
    VmOn { vm_uuid: String },

    /// Power a test VM off.
    VmOff { vm_uuid: String },
}

#[derive(clap::Args)]
struct BuildArgs {
    #[arg(long, default_value = "waf")]
    app: String,
    #[arg(long)]
    version: String,
    /// soft, hard, cloud or soft_cloud.
    #[arg(long, default_value = "soft")]
    ware: WareVersion,
    #[arg(long, default_value = "uguardsec")]
    channel: String,
    #[arg(long, default_value_t = 4)]
    cpu: u32,
    /// Memory in GB.
    #[arg(long, default_value_t = 8)]
    memory: u32,
    /// Disk in GB.
    #[arg(long, default_value_t = 50)]
    disk: u32,
    /// Deploy host for soft and soft_cloud builds.
    #[arg(long)]
    host: Option<String>,
    /// Cloud platform for cloud builds.
    #[arg(long, default_value = "none")]
    cloud: CloudPlatform,
    /// Rebuild every component from scratch.
    #[arg(long)]
    new: bool,
    /// Commit override as `name@version=commit`; repeatable.
    #[arg(long = "commit", value_parser = parse_commit)]
    commits: Vec<(String, String)>,
}

fn parse_commit(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((component, commit)) if component.contains('@') && !commit.is_empty() => {
            Ok((component.to_string(), commit.to_string()))
        }
        _ => Err(format!("expected name@version=commit, got {s:?}")),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let file_config = cli
        .config
        .as_deref()
        .map(|path| (path, ConsoleConfig::from_toml_file(path)));

    let base = match &file_config {
        Some((_, Ok(cfg))) => cfg.clone(),
        _ => ConsoleConfig::default(),
    };
    let config = ConsoleConfig {
        api_base_url: cli.api_base_url.unwrap_or(base.api_base_url),
        log_level: cli.log_level.unwrap_or(base.log_level),
        log_format: cli.log_format.unwrap_or(base.log_format),
        ..base
    };

    metis_utils::init_logging(config.log_format, &config.log_level);

    match file_config {
        Some((path, Ok(_))) => tracing::debug!("Loaded config from {}", path.display()),
        Some((_, Err(e))) => tracing::warn!("{e}, using defaults"),
        None => {}
    }
    tracing::debug!(api_base_url = %config.api_base_url, "using build backend");

    let backend: Arc<dyn BuildBackend> = Arc::new(config.build_client());
    run(cli.command, &config, backend).await
}

async fn run(
    command: Command,
    config: &ConsoleConfig,
    backend: Arc<dyn BuildBackend>,
) -> anyhow::Result<()> {
    match command {
        Command::Versions { project } => {
            for version in backend.versions(&project).await? {
                println!("{version}");
            }
        }
        Command::Hosts => {
            let mut catalog = HostCatalog::new();
            let hosts = catalog.ensure_loaded(backend.as_ref()).await?;
            print!("{}", output::hosts(hosts));
        }
        Command::Components { app, version } => {
            let components = backend.project_components(&app, &version).await?;
            print!("{}", output::components(&components));
        }
        Command::Build(args) => submit_build(args, backend).await?,
        Command::History {
            project,
            version,
            pages,
        } => {
            let feed = load_history(config, backend, &project, &version, pages).await?;
            print!("{}", output::history_table(&feed, SystemClock.now()));
            if feed.has_more() {
                println!("(more builds available; use --pages)");
            }
        }
        Command::HistoryWatch { project, version } => {
            let feed = load_history(config, backend, &project, &version, u32::MAX).await?;
            watch_countdowns(config, &feed).await;
        }
        Command::Details { deploy_id } => {
            println!("{}", output::details(&backend.build_details(&deploy_id).await?));
        }
        Command::Task { deploy_id, watch } => {
            let monitor = TaskMonitor::new(backend, config);
            if watch {
                let shutdown = Arc::new(ShutdownController::new());
                let signals = Arc::clone(&shutdown);
                tokio::spawn(async move { signals.wait_for_signal().await });
                let settled = monitor
                    .watch(&deploy_id, shutdown.subscribe(), |task| {
                        println!("{}", output::task_line(task));
                    })
                    .await?;
                if settled.is_none() {
                    tracing::info!("stopped watching {deploy_id}");
                }
            } else {
                println!("{}", output::task_line(&monitor.snapshot(&deploy_id).await?));
            }
        }
        Command::Lock { deploy_id } => set_lock(config, backend, &deploy_id, true).await?,
        Command::Unlock { deploy_id } => set_lock(config, backend, &deploy_id, false).await?,
        Command::Delete { deploy_id } => {
            let mut feed = HistoryFeed::new(backend, config);
            feed.locate(&deploy_id).await?;
            feed.delete(&deploy_id)
                .await
                .with_context(|| format!("failed to delete {deploy_id}"))?;
            println!("deleted {deploy_id}");
        }
        Command::Stop { deploy_id } => {
            let mut feed = HistoryFeed::new(backend, config);
            feed.locate(&deploy_id).await?;
            feed.stop(&deploy_id).await?;
            println!("stopped {deploy_id}");
        }
        Command::Vms => {
            let mut inventory = VmInventory::new(backend);
            print!("{}", output::vms(inventory.refresh().await?));
        }
        Command::VmOn { vm_uuid } => power(backend, &vm_uuid, VmAction::PowerOn).await?,
        Command::VmOff { vm_uuid } => power(backend, &vm_uuid, VmAction::PowerOff).await?,
    }
    Ok(())
}

async fn load_history(
    config: &ConsoleConfig,
    backend: Arc<dyn BuildBackend>,
    project: &str,
    version: &str,
    pages: u32,
) -> anyhow::Result<HistoryFeed> {
    let mut feed = HistoryFeed::new(backend, config);
    if !project.is_empty() {
        feed.select_project(project).await?;
    }
    if !version.is_empty() {
        feed.select_version(version);
    }
    feed.load_pages(pages).await?;
    Ok(feed)
}

async fn watch_countdowns(config: &ConsoleConfig, feed: &HistoryFeed) {
    let shutdown = Arc::new(ShutdownController::new());
    let signals = Arc::clone(&shutdown);
    tokio::spawn(async move { signals.wait_for_signal().await });

    let clock = SystemClock;
    run_ticker(config.countdown_tick(), shutdown.subscribe(), |_| {
        let now = clock.now();
        print!("{}", output::history_table(feed, now));
        println!();
        if feed.countdowns().active_count(now) == 0 {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    })
    .await;
}

async fn submit_build(args: BuildArgs, backend: Arc<dyn BuildBackend>) -> anyhow::Result<()> {
    let mut wizard = BuildWizard::new(backend);
    wizard.set_app_name(&args.app).await?;
    wizard.set_ware_version(args.ware);
    wizard.set_channel(&args.channel)?;
    wizard.set_cpu(args.cpu)?;
    wizard.set_memory(args.memory)?;
    wizard.set_disk(args.disk)?;
    wizard.set_cloud_platform(args.cloud)?;
    wizard.set_new_build(args.new);
    if let Some(host) = &args.host {
        wizard.select_host(host).await?;
    }
    wizard
        .set_app_version(&args.version)
        .await
        .with_context(|| format!("{} has no version {}", args.app, args.version))?;

    if wizard.next() == WizardStep::Configuration {
        for (component, commit) in &args.commits {
            wizard.select_commit(component, commit)?;
        }
        wizard.next();
    } else if !args.commits.is_empty() {
        bail!("{} builds take no component commits", args.ware);
    }

    print!(
        "{}",
        output::build_preview(wizard.request(), wizard.selected_host())
    );
    wizard.submit().await?;
    println!("build submitted");
    Ok(())
}

async fn set_lock(
    config: &ConsoleConfig,
    backend: Arc<dyn BuildBackend>,
    deploy_id: &str,
    lock: bool,
) -> anyhow::Result<()> {
    let mut feed = HistoryFeed::new(backend, config);
    feed.locate(deploy_id).await?;
    if feed.is_locked(deploy_id) == lock {
        println!("{deploy_id} is already {}", if lock { "locked" } else { "unlocked" });
        return Ok(());
    }
    let locked = feed.toggle_lock(deploy_id).await?;
    println!("{deploy_id} {}", if locked { "locked" } else { "unlocked" });
    Ok(())
}

async fn power(
    backend: Arc<dyn BuildBackend>,
    vm_uuid: &str,
    action: VmAction,
) -> anyhow::Result<()> {
    let mut inventory = VmInventory::new(backend);
    inventory.refresh().await?;
    inventory.power(vm_uuid, action).await?;
    println!("{vm_uuid}: {action}");
    Ok(())
}
