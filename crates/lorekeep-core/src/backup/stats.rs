//! Backup statistics for display

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::backup::{BackupRecord, BackupType};

/// Aggregate view over stored backups
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupStats {
    pub total_backups: usize,
    pub auto_backups: usize,
    pub manual_backups: usize,
    /// Sum of backup sizes in bytes
    pub total_size: u64,
    pub oldest_backup: Option<DateTime<Utc>>,
    pub newest_backup: Option<DateTime<Utc>>,
}

impl BackupStats {
    #[must_use]
    pub fn from_backups(backups: &[BackupRecord]) -> Self {
        let mut stats = Self::default();
        for backup in backups {
            stats.total_backups += 1;
            match backup.backup_type {
                BackupType::Auto => stats.auto_backups += 1,
                BackupType::Manual => stats.manual_backups += 1,
            }
            stats.total_size = stats.total_size.saturating_add(backup.size);
            stats.oldest_backup = Some(
                stats
                    .oldest_backup
                    .map_or(backup.created_at, |t| t.min(backup.created_at)),
            );
            stats.newest_backup = Some(
                stats
                    .newest_backup
                    .map_or(backup.created_at, |t| t.max(backup.created_at)),
            );
        }
        stats
    }
}

/// Human-readable byte count
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}
