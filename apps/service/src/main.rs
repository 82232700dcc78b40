use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use webpulse::Config;

mod orchestrator;

use orchestrator::Orchestrator;

/// Website reachability monitor
#[derive(Parser, Debug)]
#[command(name = "webpulse-service")]
#[command(version, about, long_about = None)]
#[command(after_help = r#"ENVIRONMENT VARIABLES:
    WEBPULSE_DATABASE_PATH  Registry database file
    RUST_LOG                Log filter (default: info)
    RUST_LOG_FORMAT         Log format, "json" or "compact"
"#)]
struct Cli {
    /// Config file (default: $XDG_CONFIG_HOME/webpulse/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the scheduler and the worker pool until interrupted
    Run,
    /// Batch the registry once, probe everything, then exit
    Cycle,
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    logger::init_tracing();

    let cli = Cli::parse();
    let config = Config::from_config(cli.config.as_ref())?.with_env_overrides();

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            info!("Starting webpulse service");
            Orchestrator::start(config).await
        }
        Command::Cycle => {
            let report = Orchestrator::new(config).await?.run_cycle().await?;
            info!(
                sites = report.sites,
                published = report.published,
                failed = report.failed.len(),
                "Cycle complete"
            );
            Ok(())
        }
        Command::Config => {
            println!("{config}");
            Ok(())
        }
    }
}
