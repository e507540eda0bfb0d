//! `lorekeep daemon`
//!
//! Hydrates live state, persists every change and runs the backup timer until
//! interrupted.

use anyhow::Result;
use lorekeep_core::sync::{LiveState, StateSync};
use lorekeep_core::{BackupScheduler, CampaignSelector};
use tracing::{info, warn};

use super::Context;

pub async fn execute(ctx: &Context) -> Result<()> {
    let sync = StateSync::new(ctx.store.clone(), LiveState::new());
    if let Err(e) = sync.hydrate() {
        // Hydration failure leaves an empty live state; persistence still runs
        warn!(error = %e, "starting with empty state");
    }
    let persistence = sync.spawn();

    let scheduler = BackupScheduler::new(ctx.store.clone(), CampaignSelector::current());
    let policy = scheduler.init()?;
    let mut ticks = scheduler.subscribe_ticks();

    info!(
        data_dir = %ctx.config.data_dir.display(),
        enabled = policy.auto_backup_enabled,
        interval_minutes = policy.backup_interval,
        "daemon running, press Ctrl-C to stop"
    );

    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    warn!(error = %e, "failed to listen for Ctrl-C");
                }
                break;
            }
            changed = ticks.changed() => {
                if changed.is_err() {
                    break;
                }
                let count = *ticks.borrow_and_update();
                info!(ticks = count, "backup tick completed");
            }
        }
    }

    scheduler.stop();
    persistence.shutdown().await;
    info!("daemon stopped");
    Ok(())
}
