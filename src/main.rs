use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use ratekeeper::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    /// Keep all data in memory instead of the on-disk store
    #[arg(long, global = true)]
    in_memory: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for ratekeeper::AppCommand {
    fn from(cmd: Commands) -> ratekeeper::AppCommand {
        match cmd {
            Commands::Seed => ratekeeper::AppCommand::Seed,
            Commands::Sync => ratekeeper::AppCommand::Sync,
            Commands::Serve { refresh_on_start } => {
                ratekeeper::AppCommand::Serve { refresh_on_start }
            }
            Commands::Snapshot { json } => ratekeeper::AppCommand::Snapshot { json },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Populate the currency catalog and initial metal prices
    Seed,
    /// Run one sync cycle now
    Sync,
    /// Run the daily scheduler until interrupted
    Serve {
        /// Queue a refresh as soon as the scheduler starts
        #[arg(long)]
        refresh_on_start: bool,
    },
    /// Display stored prices and rates
    Snapshot {
        /// Print JSON instead of tables
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => ratekeeper::cli::setup::setup(),
        Some(cmd) => {
            ratekeeper::run_command(cmd.into(), cli.config_path.as_deref(), cli.in_memory).await
        }
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
