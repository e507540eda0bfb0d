//! CLI command handlers
//!
//! Each command group has its own module with a subcommand enum and an
//! `execute` entry point.

pub mod backup;
pub mod cloud;
pub mod daemon;
pub mod policy;
pub mod state;
pub mod status;
pub mod transfer;

use anyhow::{Context as _, Result};
use lorekeep_cloud::CloudMirror;
use lorekeep_core::{BackupScheduler, CampaignSelector, LocalStore};
use std::sync::Arc;

use crate::config::Config;

/// Everything a command needs: resolved configuration and the open store
pub struct Context {
    pub config: Config,
    pub store: LocalStore,
}

impl Context {
    /// Open (creating if needed) the local store in the data directory
    pub fn open(config: Config) -> Result<Self> {
        let store = LocalStore::new(config.database_path());
        store.init().with_context(|| {
            format!(
                "Failed to open local store at {}",
                config.database_path().display()
            )
        })?;
        Ok(Self { config, store })
    }

    /// Scheduler over the current campaign with the stored policy loaded
    ///
    /// The timer is not started.
    pub fn scheduler(&self) -> Result<Arc<BackupScheduler>> {
        let scheduler = BackupScheduler::new(self.store.clone(), CampaignSelector::current());
        scheduler.load_policy()?;
        Ok(scheduler)
    }

    pub fn mirror(&self) -> Result<CloudMirror> {
        Ok(CloudMirror::from_config(
            self.store.clone(),
            &self.config.cloud,
            self.config.session.clone(),
        )?)
    }
}

/// Render a timestamp the way listings show it
pub fn format_time(at: chrono::DateTime<chrono::Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}
