//! Automatic backup scheduler
//!
//! One `BackupScheduler` is built per process and owns its timer task. The
//! timer is either running or stopped; changing the policy stops it and, when
//! automatic backups stay enabled, starts a fresh one with the new interval.
//!
//! ```text
//! Stopped --init(enabled) / start()--> Running
//! Running --update_policy(disabled) / stop()--> Stopped
//! Running --tick--> Running   (auto snapshot + retention)
//! ```

use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::backup::snapshot::{create_backup, restore_backup};
use crate::backup::{BackupError, BackupPolicy, BackupRecord, BackupStats, BackupType};
use crate::campaign::{CampaignRecord, CampaignSelector};
use crate::storage::LocalStore;

/// Timer lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Stopped,
    Running,
}

struct Timer {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
    period: Duration,
}

/// Owns the backup policy and the recurring snapshot timer
pub struct BackupScheduler {
    store: LocalStore,
    source: CampaignSelector,
    policy: Mutex<BackupPolicy>,
    timer: Mutex<Option<Timer>>,
    ticks: watch::Sender<u64>,
}

impl BackupScheduler {
    /// Build a stopped scheduler snapshotting `source`
    #[must_use]
    pub fn new(store: LocalStore, source: CampaignSelector) -> Arc<Self> {
        let (ticks, _) = watch::channel(0);
        Arc::new(Self {
            store,
            source,
            policy: Mutex::new(BackupPolicy::default()),
            timer: Mutex::new(None),
            ticks,
        })
    }

    /// Load the stored policy and start the timer if it is enabled
    ///
    /// # Errors
    /// Returns an error if the settings cannot be read
    ///
    /// # Panics
    /// Panics if the policy is enabled and no tokio runtime is running
    pub fn init(self: &Arc<Self>) -> Result<BackupPolicy, BackupError> {
        let policy = self.load_policy()?;

        if policy.auto_backup_enabled {
            self.start();
        } else {
            info!("automatic backups disabled");
        }
        Ok(policy)
    }

    /// Load the stored policy without touching the timer
    ///
    /// # Errors
    /// Returns an error if the settings cannot be read
    pub fn load_policy(&self) -> Result<BackupPolicy, BackupError> {
        let policy = BackupPolicy::load(&self.store)?;
        *self.lock_policy() = policy;
        Ok(policy)
    }

    #[must_use]
    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    #[must_use]
    pub fn policy(&self) -> BackupPolicy {
        *self.lock_policy()
    }

    /// Persist a new policy and restart or stop the timer to match it
    ///
    /// # Errors
    /// Returns an error if the policy is invalid or cannot be saved
    ///
    /// # Panics
    /// Panics if the policy is enabled and no tokio runtime is running
    pub fn update_policy(self: &Arc<Self>, policy: BackupPolicy) -> Result<(), BackupError> {
        policy.save(&self.store)?;
        let previous = std::mem::replace(&mut *self.lock_policy(), policy);

        let timer_changed = previous.auto_backup_enabled != policy.auto_backup_enabled
            || previous.backup_interval != policy.backup_interval;

        if !policy.auto_backup_enabled {
            self.stop();
        } else if timer_changed || self.state() == SchedulerState::Stopped {
            self.start();
        }

        info!(?policy, "backup policy updated");
        Ok(())
    }

    /// Start (or restart) the timer with the current interval
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime
    pub fn start(self: &Arc<Self>) {
        self.stop();

        let period = self.policy().interval();
        let (stop, stop_rx) = watch::channel(false);
        let task = tokio::spawn(run_timer(Arc::downgrade(self), period, stop_rx));

        *self.lock_timer() = Some(Timer { stop, task, period });
        info!(interval_secs = period.as_secs(), "backup scheduler started");
    }

    /// Stop the timer; a snapshot already in progress still completes
    pub fn stop(&self) {
        if let Some(timer) = self.lock_timer().take() {
            let _ = timer.stop.send(true);
            info!("backup scheduler stopped");
        }
    }

    #[must_use]
    pub fn state(&self) -> SchedulerState {
        match self.lock_timer().as_ref() {
            Some(timer) if !timer.task.is_finished() => SchedulerState::Running,
            _ => SchedulerState::Stopped,
        }
    }

    /// Period of the running timer
    #[must_use]
    pub fn running_interval(&self) -> Option<Duration> {
        self.lock_timer().as_ref().map(|timer| timer.period)
    }

    /// Observe completed timer ticks
    #[must_use]
    pub fn subscribe_ticks(&self) -> watch::Receiver<u64> {
        self.ticks.subscribe()
    }

    /// One timer tick: automatic snapshot, then automatic retention
    ///
    /// # Errors
    /// Returns an error if the snapshot cannot be written
    pub fn run_tick(&self) -> Result<Option<BackupRecord>, BackupError> {
        let policy = self.policy();
        create_backup(
            &self.store,
            &self.source,
            BackupType::Auto,
            None,
            policy.max_auto_backups,
        )
    }

    /// Snapshot on explicit user request
    ///
    /// # Errors
    /// Returns an error if the snapshot cannot be written
    pub fn create_manual_backup(
        &self,
        name: Option<String>,
    ) -> Result<Option<BackupRecord>, BackupError> {
        let policy = self.policy();
        create_backup(
            &self.store,
            &self.source,
            BackupType::Manual,
            name,
            policy.max_manual_backups,
        )
    }

    /// Overwrite the current campaign with a backup
    ///
    /// # Errors
    /// Returns an error if the backup does not exist or cannot be applied
    pub fn restore(&self, id: &str) -> Result<CampaignRecord, BackupError> {
        restore_backup(&self.store, id)
    }

    /// All backups, newest first
    ///
    /// # Errors
    /// Returns an error if the store cannot be read
    pub fn list_backups(&self) -> Result<Vec<BackupRecord>, BackupError> {
        Ok(self.store.get_all_backups()?)
    }

    /// Delete one backup by id
    ///
    /// # Errors
    /// Returns an error if the backup cannot be deleted
    pub fn delete_backup(&self, id: &str) -> Result<bool, BackupError> {
        let deleted = self.store.delete_backup(id)?;
        if deleted {
            info!(id, "backup deleted");
        }
        Ok(deleted)
    }

    /// Apply both retention caps now; returns how many backups were removed
    ///
    /// # Errors
    /// Returns an error if the backups cannot be deleted
    pub fn enforce_retention(&self) -> Result<usize, BackupError> {
        let policy = self.policy();
        let auto = self.store.cleanup_old_backups(policy.max_auto_backups)?;
        let manual = self
            .store
            .cleanup_backups_of_type(BackupType::Manual, policy.max_manual_backups)?;
        Ok(auto + manual)
    }

    /// Read-only statistics
    ///
    /// # Errors
    /// Returns an error if the store cannot be read
    pub fn stats(&self) -> Result<BackupStats, BackupError> {
        Ok(BackupStats::from_backups(&self.store.get_all_backups()?))
    }

    fn tick(&self) {
        match self.run_tick() {
            Ok(Some(record)) => debug!(id = %record.id, "automatic backup tick"),
            Ok(None) => debug!("automatic backup tick skipped"),
            Err(e) => error!(error = %e, "automatic backup failed"),
        }
        self.ticks.send_modify(|count| *count += 1);
    }

    fn lock_policy(&self) -> std::sync::MutexGuard<'_, BackupPolicy> {
        self.policy.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_timer(&self) -> std::sync::MutexGuard<'_, Option<Timer>> {
        self.timer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for BackupScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_timer(
    scheduler: Weak<BackupScheduler>,
    period: Duration,
    mut stop: watch::Receiver<bool>,
) {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = stop.changed() => break,
        }

        let Some(scheduler) = scheduler.upgrade() else {
            break;
        };
        // Outside the select, so stop() never cuts a snapshot short
        scheduler.tick();
    }
    debug!("backup timer exited");
}
