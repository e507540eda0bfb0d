//! Cloud backup commands
//!
//! Handles: lorekeep cloud upload/list/download/restore/delete

use anyhow::{anyhow, Result};
use clap::Subcommand;
use lorekeep_cloud::CloudResponse;
use std::path::PathBuf;

use super::{format_time, Context};

#[derive(Subcommand)]
pub enum CloudCommands {
    /// Upload the current campaign
    Upload {
        /// Label appended to the file name
        #[arg(short, long)]
        name: Option<String>,
    },
    /// List remote backups, newest first
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Download a remote backup
    Download {
        /// Remote file name
        file: String,
        /// Save to this path instead of printing
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Overwrite the current campaign with a remote backup
    Restore {
        /// Remote file name
        file: String,
    },
    /// Delete a remote backup
    Delete {
        /// Remote file name
        file: String,
    },
}

pub async fn execute(ctx: &Context, cmd: CloudCommands) -> Result<()> {
    let mirror = ctx.mirror()?;

    match cmd {
        CloudCommands::Upload { name } => {
            let uploaded = unwrap(mirror.upload(name.as_deref()).await)?;
            println!("Uploaded: {}", uploaded.file_name);
            println!("  Label: {}", uploaded.name);
        }
        CloudCommands::List { json } => {
            let backups = unwrap(mirror.list().await)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&backups)?);
            } else if backups.is_empty() {
                println!("No cloud backups found.");
            } else {
                println!("Cloud backups:");
                for b in backups {
                    let created = b.created_at.map(format_time).unwrap_or_default();
                    println!("  {} - {} {} ({} bytes)", b.file_name, b.name, created, b.size);
                }
            }
        }
        CloudCommands::Download { file, output } => match output {
            Some(path) => {
                let written = unwrap(mirror.export_to_file(&file, &path).await)?;
                println!("Saved {file} to: {}", written.display());
            }
            None => {
                let data = unwrap(mirror.download(&file).await)?;
                println!("{}", serde_json::to_string_pretty(&data)?);
            }
        },
        CloudCommands::Restore { file } => {
            let campaign = unwrap(mirror.restore(&file).await)?;
            println!("Restored {file} as current campaign '{}'", campaign.name);
        }
        CloudCommands::Delete { file } => {
            unwrap(mirror.delete(&file).await)?;
            println!("Deleted cloud backup: {file}");
        }
    }

    Ok(())
}

fn unwrap<T>(response: CloudResponse<T>) -> Result<T> {
    response.into_result().map_err(|e| anyhow!(e))
}
