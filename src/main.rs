use anyhow::Result;
use bdtrack::core::log::init_logging;
use clap::{CommandFactory, Parser, Subcommand};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Fetch balances once and display them
    Balance {
        /// Print metrics as JSON
        #[arg(long)]
        json: bool,
    },
    /// Keep refreshing balances on the configured interval
    Watch {
        /// Print metrics as JSON after every refresh
        #[arg(long)]
        json: bool,
    },
}

impl From<Commands> for bdtrack::AppCommand {
    fn from(cmd: Commands) -> bdtrack::AppCommand {
        match cmd {
            Commands::Balance { json } => bdtrack::AppCommand::Balance { json },
            Commands::Watch { json } => bdtrack::AppCommand::Watch { json },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => bdtrack::cli::setup::setup_at_path(path),
            None => bdtrack::cli::setup::setup(),
        },
        Some(cmd) => bdtrack::run_command(cmd.into(), cli.config_path.as_deref()).await,
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
