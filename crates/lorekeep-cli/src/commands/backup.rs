//! Local backup commands
//!
//! Handles: lorekeep backup create/list/show/restore/delete/stats/cleanup

use anyhow::{anyhow, bail, Result};
use clap::Subcommand;
use lorekeep_core::backup::stats::format_size;
use serde_json::json;

use super::{format_time, Context};

#[derive(Subcommand)]
pub enum BackupCommands {
    /// Snapshot the current campaign now
    Create {
        /// Backup name (defaults to "Manual Backup <timestamp>")
        #[arg(short, long)]
        name: Option<String>,
    },
    /// List backups, newest first
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print one backup
    Show {
        /// Backup ID
        id: String,
    },
    /// Overwrite the current campaign with a backup
    Restore {
        /// Backup ID
        id: String,
    },
    /// Delete a backup
    Delete {
        /// Backup ID
        id: String,
    },
    /// Show backup statistics
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Apply the retention caps now
    Cleanup,
}

pub fn execute(ctx: &Context, cmd: BackupCommands) -> Result<()> {
    let scheduler = ctx.scheduler()?;

    match cmd {
        BackupCommands::Create { name } => match scheduler.create_manual_backup(name)? {
            Some(backup) => {
                println!("Created backup: {}", backup.id);
                println!("  Name: {}", backup.name);
                println!("  Size: {}", format_size(backup.size));
            }
            None => bail!("No campaign to back up"),
        },
        BackupCommands::List { json } => {
            let backups = scheduler.list_backups()?;
            if json {
                let output = json!({
                    "count": backups.len(),
                    "backups": backups.iter().map(|b| json!({
                        "id": b.id,
                        "name": b.name,
                        "type": b.backup_type,
                        "createdAt": b.created_at,
                        "size": b.size,
                    })).collect::<Vec<_>>(),
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else if backups.is_empty() {
                println!("No backups found.");
            } else {
                println!("Backups:");
                for b in backups {
                    println!(
                        "  {} - {} [{}] {} ({})",
                        b.id,
                        b.name,
                        b.backup_type,
                        format_time(b.created_at),
                        format_size(b.size)
                    );
                }
            }
        }
        BackupCommands::Show { id } => {
            let backup = ctx
                .store
                .get_backup(&id)?
                .ok_or_else(|| anyhow!("Backup not found: {id}"))?;
            println!("{}", serde_json::to_string_pretty(&backup)?);
        }
        BackupCommands::Restore { id } => {
            let campaign = scheduler.restore(&id)?;
            println!("Restored backup {id} as current campaign '{}'", campaign.name);
        }
        BackupCommands::Delete { id } => {
            if !scheduler.delete_backup(&id)? {
                bail!("Backup not found: {id}");
            }
            println!("Deleted backup: {id}");
        }
        BackupCommands::Stats { json } => {
            let stats = scheduler.stats()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("Total backups: {}", stats.total_backups);
                println!("  Automatic: {}", stats.auto_backups);
                println!("  Manual: {}", stats.manual_backups);
                println!("Total size: {}", format_size(stats.total_size));
                if let Some(oldest) = stats.oldest_backup {
                    println!("Oldest: {}", format_time(oldest));
                }
                if let Some(newest) = stats.newest_backup {
                    println!("Newest: {}", format_time(newest));
                }
            }
        }
        BackupCommands::Cleanup => {
            let removed = scheduler.enforce_retention()?;
            println!("Removed {removed} backups.");
        }
    }

    Ok(())
}
