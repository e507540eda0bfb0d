//! `lorekeep status`

use anyhow::Result;
use lorekeep_core::backup::BackupStats;
use lorekeep_core::{BackupPolicy, CURRENT_CAMPAIGN_ID};
use serde_json::json;

use super::{format_time, Context};

pub fn execute(ctx: &Context, json_output: bool) -> Result<()> {
    let current = ctx.store.get_campaign(CURRENT_CAMPAIGN_ID)?;
    let campaigns = ctx.store.get_all_campaigns()?;
    let stats = BackupStats::from_backups(&ctx.store.get_all_backups()?);
    let policy = BackupPolicy::load(&ctx.store)?;
    let schema_version = ctx.store.with_db(|db| db.schema_version())?;
    let archived = campaigns.iter().filter(|c| !c.is_current()).count();
    let mirror = ctx.mirror()?;

    if json_output {
        let output = json!({
            "dataDir": ctx.config.data_dir,
            "configFile": ctx.config.config_path(),
            "schemaVersion": schema_version,
            "currentCampaign": current.as_ref().map(|c| json!({
                "name": c.name,
                "version": c.version,
                "updatedAt": c.updated_at,
            })),
            "campaigns": campaigns.len(),
            "archivedCampaigns": archived,
            "backups": stats,
            "policy": policy,
            "cloud": {
                "configured": mirror.is_configured(),
                "signedIn": mirror.is_signed_in(),
            },
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Lorekeep Status");
    println!("===============\n");
    println!("Data directory: {}", ctx.config.data_dir.display());
    println!("Config file: {}", ctx.config.config_path().display());
    println!("Schema version: {schema_version}");

    match &current {
        Some(campaign) => println!(
            "Current campaign: {} (v{}, updated {})",
            campaign.name,
            campaign.version,
            format_time(campaign.updated_at)
        ),
        None => println!("Current campaign: none"),
    }
    println!("Stored campaigns: {} ({archived} archived)", campaigns.len());

    println!(
        "\nBackups: {} ({} auto, {} manual, {})",
        stats.total_backups,
        stats.auto_backups,
        stats.manual_backups,
        lorekeep_core::backup::stats::format_size(stats.total_size)
    );
    println!(
        "Automatic backups: {} every {} min (keep {} auto, {} manual)",
        if policy.auto_backup_enabled { "on" } else { "off" },
        policy.backup_interval,
        policy.max_auto_backups,
        policy.max_manual_backups
    );

    let cloud = if !mirror.is_configured() {
        "not configured"
    } else if mirror.is_signed_in() {
        "ready"
    } else {
        "signed out"
    };
    println!("Cloud: {cloud}");

    Ok(())
}
