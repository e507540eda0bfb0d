//! Backup policy commands
//!
//! Handles: lorekeep policy show/set

use anyhow::Result;
use clap::{Args, Subcommand};
use lorekeep_core::BackupPolicy;

use super::Context;

#[derive(Subcommand)]
pub enum PolicyCommands {
    /// Show the stored backup policy
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change the backup policy; omitted values are kept
    Set(PolicySetArgs),
}

/// Arguments for `lorekeep policy set`
#[derive(Args)]
pub struct PolicySetArgs {
    /// Turn automatic backups on or off
    #[arg(long)]
    pub enabled: Option<bool>,

    /// Minutes between automatic backups
    #[arg(long, value_name = "MINUTES")]
    pub interval: Option<u64>,

    /// Automatic backups to keep
    #[arg(long)]
    pub max_auto: Option<usize>,

    /// Manual backups to keep
    #[arg(long)]
    pub max_manual: Option<usize>,
}

impl PolicySetArgs {
    /// Overlay the given values on `policy`
    #[must_use]
    pub fn apply(&self, mut policy: BackupPolicy) -> BackupPolicy {
        if let Some(enabled) = self.enabled {
            policy.auto_backup_enabled = enabled;
        }
        if let Some(interval) = self.interval {
            policy.backup_interval = interval;
        }
        if let Some(max_auto) = self.max_auto {
            policy.max_auto_backups = max_auto;
        }
        if let Some(max_manual) = self.max_manual {
            policy.max_manual_backups = max_manual;
        }
        policy
    }
}

pub fn execute(ctx: &Context, cmd: PolicyCommands) -> Result<()> {
    match cmd {
        PolicyCommands::Show { json } => {
            let policy = BackupPolicy::load(&ctx.store)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&policy)?);
            } else {
                print_policy(&policy);
            }
        }
        PolicyCommands::Set(args) => {
            let policy = args.apply(BackupPolicy::load(&ctx.store)?);
            // The running daemon picks the change up on its next start
            policy.save(&ctx.store)?;
            println!("Backup policy updated.");
            print_policy(&policy);
        }
    }
    Ok(())
}

fn print_policy(policy: &BackupPolicy) {
    println!(
        "  Automatic backups: {}",
        if policy.auto_backup_enabled { "enabled" } else { "disabled" }
    );
    println!("  Interval: {} minutes", policy.backup_interval);
    println!("  Keep automatic: {}", policy.max_auto_backups);
    println!("  Keep manual: {}", policy.max_manual_backups);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_keeps_omitted_values() {
        let args = PolicySetArgs {
            enabled: None,
            interval: Some(5),
            max_auto: None,
            max_manual: Some(3),
        };

        let policy = args.apply(BackupPolicy::default());

        assert!(policy.auto_backup_enabled);
        assert_eq!(policy.backup_interval, 5);
        assert_eq!(policy.max_auto_backups, 10);
        assert_eq!(policy.max_manual_backups, 3);
    }
}
