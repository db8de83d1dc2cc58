use anyhow::Result;
use clap::Parser;
use kubestrap::config::NodeConfig;
use kubestrap::prompt::TerminalPrompter;
use kubestrap::utils::{DryRunHost, HostEnvironment, LocalHost};
use kubestrap::workflow::StepContext;
use kubestrap::{bootstrap, error};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kubestrap", version)]
#[command(about = "Turn a bare Ubuntu host into a Kubernetes control plane or worker node", long_about = None)]
struct Cli {
    /// Print every change instead of applying it
    #[arg(long)]
    dry_run: bool,
    /// Configuration file (default: /etc/kubestrap/config.toml if present)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = NodeConfig::load(cli.config.as_deref())?;
    tracing::info!(version = %config.kubernetes_version, dry_run = cli.dry_run, "starting");

    let host: Box<dyn HostEnvironment> = if cli.dry_run {
        Box::new(DryRunHost::new()?)
    } else {
        Box::new(LocalHost::new()?)
    };
    let ctx = StepContext {
        host: host.as_ref(),
        prompter: &TerminalPrompter,
        config: &config,
    };

    bootstrap::run(&ctx)?;
    Ok(())
}

fn main() {
    // A missing .env is fine
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!("✗ {:#}", err);
        std::process::exit(error::exit_code_for(&err));
    }
}
