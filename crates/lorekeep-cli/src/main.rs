//! Lorekeep CLI - campaign persistence, backups and transfer
//!
//! Provides `lorekeep status`, `lorekeep backup`, `lorekeep cloud`,
//! `lorekeep daemon` and the other commands.

mod commands;
mod config;
mod logging;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::backup::BackupCommands;
use commands::cloud::CloudCommands;
use commands::policy::PolicyCommands;
use commands::state::StateCommands;
use commands::Context;
use config::Config;

#[derive(Parser)]
#[command(name = "lorekeep")]
#[command(about = "Lorekeep - campaign data persistence and backups")]
#[command(version)]
struct Cli {
    /// Debug logging for lorekeep crates
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Data directory (defaults to $LOREKEEP_DATA_DIR, then ~/.lorekeep)
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show store, backup and cloud status
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Inspect or edit the campaign state
    State {
        #[command(subcommand)]
        action: StateCommands,
    },
    /// Manage local backups
    Backup {
        #[command(subcommand)]
        action: BackupCommands,
    },
    /// Manage the automatic backup policy
    Policy {
        #[command(subcommand)]
        action: PolicyCommands,
    },
    /// Export the current campaign as a bundle
    Export {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Import a campaign bundle as the current campaign
    Import {
        /// Bundle file
        file: PathBuf,
    },
    /// Import a legacy state file, then delete it
    MigrateLegacy {
        /// Legacy state file
        file: PathBuf,
    },
    /// Manage cloud backups
    Cloud {
        #[command(subcommand)]
        action: CloudCommands,
    },
    /// Persist state and run automatic backups until interrupted
    Daemon,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if matches!(cli.command, Commands::Daemon) {
        "info"
    } else {
        "warn"
    };
    logging::init(cli.verbose, default_level);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.data_dir)?;
    let ctx = Context::open(config)?;

    match cli.command {
        Commands::Status { json } => commands::status::execute(&ctx, json),
        Commands::State { action } => commands::state::execute(&ctx, action),
        Commands::Backup { action } => commands::backup::execute(&ctx, action),
        Commands::Policy { action } => commands::policy::execute(&ctx, action),
        Commands::Export { output } => commands::transfer::execute_export(&ctx, output.as_deref()),
        Commands::Import { file } => commands::transfer::execute_import(&ctx, &file),
        Commands::MigrateLegacy { file } => {
            commands::transfer::execute_migrate_legacy(&ctx, &file)
        }
        Commands::Cloud { action } => commands::cloud::execute(&ctx, action).await,
        Commands::Daemon => commands::daemon::execute(&ctx).await,
    }
}
