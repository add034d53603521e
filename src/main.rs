mod cmd;
mod config;
mod context;
mod domain;
mod error;
mod infra;
mod services;
mod workflow;

use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::cmd::config::{self as config_cmd, ConfigArgs};
use crate::cmd::draft::{self, DraftArgs};
use crate::config::AppConfig;
use crate::context::AppContext;
use crate::error::AppResult;

#[derive(Parser)]
#[command(
    name = "groom",
    author,
    version,
    about = "Refine a rough feature idea into a ticket draft"
)]
struct Cli {
    /// Log debug output to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Draft a ticket through question-and-answer refinement.
    Draft(DraftArgs),
    /// Manage CLI configuration.
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    if let Err(error) = run(cli.command).await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

fn setup_logging(verbose: bool) {
    let default_level = if verbose { "groom=debug" } else { "groom=warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(filter)
        .try_init();
}

async fn run(command: Commands) -> AppResult<()> {
    match command {
        Commands::Config(args) => config_cmd::run(args.command),
        Commands::Draft(args) => {
            let config = AppConfig::load()?;
            debug!(model = %config.gemini_model, "configuration loaded");

            let context = AppContext::new(config);
            draft::run(&context, args).await
        }
    }
}
