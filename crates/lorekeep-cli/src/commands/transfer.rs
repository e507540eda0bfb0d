//! Export, import and legacy migration
//!
//! Handles: lorekeep export/import/migrate-legacy

use anyhow::Result;
use lorekeep_core::storage::LegacyMigration;
use lorekeep_core::transfer;
use lorekeep_core::CampaignSelector;
use std::path::Path;

use super::Context;

pub fn execute_export(ctx: &Context, output: Option<&Path>) -> Result<()> {
    let selector = CampaignSelector::current();
    match output {
        Some(path) => {
            let bundle = transfer::export_to_file(&ctx.store, &selector, path)?;
            println!(
                "Exported '{}' to: {}",
                bundle.campaign_name,
                path.display()
            );
        }
        None => println!("{}", transfer::export_to_string(&ctx.store, &selector)?),
    }
    Ok(())
}

pub fn execute_import(ctx: &Context, file: &Path) -> Result<()> {
    let outcome = transfer::import_file(&ctx.store, file)?;

    println!("Imported campaign '{}'", outcome.campaign.name);
    println!("  Archived as: {}", outcome.archived_as);
    if let Some(backup) = outcome.backup {
        println!("  Backup created: {}", backup.id);
    }
    Ok(())
}

pub fn execute_migrate_legacy(ctx: &Context, file: &Path) -> Result<()> {
    match ctx.store.migrate_from_legacy(file)? {
        LegacyMigration::NotFound => println!("No legacy state found at {}", file.display()),
        LegacyMigration::Imported => println!("Imported legacy state as the current campaign."),
        LegacyMigration::Skipped => {
            println!("A current campaign already exists; legacy state was discarded.");
        }
    }
    Ok(())
}
