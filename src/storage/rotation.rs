use serde::Serialize;
use std::io::ErrorKind;
use std::time::{Duration, Instant};
use tokio::fs;
use tracing::{info, warn};

use super::{JsonStorageManager, LogPersistence, StorageError};
use crate::model::LogFile;

/// What a maintenance pass did. Maintenance is a distinct operation from
/// `save` and never runs inline on the workflow hot path.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MaintenanceReport {
    /// Entries (and their transitions) dropped by retention pruning.
    pub pruned_entries: usize,
    /// Backup files removed beyond the configured ceiling.
    pub pruned_backups: usize,
    /// Whether the log was rotated (backed up and reset).
    pub rotated: bool,
}

impl JsonStorageManager {
    /// Retention pruning plus rotation, under the exclusive writer lock.
    ///
    /// Entries older than the retention window are dropped together with
    /// their transitions. If the surviving entry count still exceeds the
    /// rotation ceiling, the artifact is backed up and reset to empty, the
    /// backup becoming the archive of the rotated-out generation. Backup
    /// pruning runs last, outside the lock.
    pub async fn run_maintenance(&self) -> Result<MaintenanceReport, StorageError> {
        let mut report = MaintenanceReport::default();

        let settings = self.settings().clone();
        let mut lock = fd_lock::RwLock::new(self.open_lock_file()?);
        let deadline = Instant::now() + Duration::from_millis(settings.lock_timeout_ms);
        let _guard = loop {
            match lock.try_write() {
                Ok(guard) => break guard,
                Err(err) if err.kind() == ErrorKind::WouldBlock => {
                    if Instant::now() >= deadline {
                        return Err(StorageError::LockTimeout {
                            waited_ms: settings.lock_timeout_ms,
                        });
                    }
                    tokio::time::sleep(Duration::from_millis(25)).await;
                }
                Err(err) => return Err(StorageError::Io(err)),
            }
        };

        let mut log = self.load().await?;
        report.pruned_entries = log.prune_older_than(settings.retention_days);

        let needs_rotation = log.entries.len() > settings.max_entries;
        if needs_rotation {
            // Persist the pruned state first so the backup archives exactly
            // what is being rotated out.
            self.save(&mut log).await?;
            self.create_backup().await?;
            log = LogFile::empty();
            report.rotated = true;
            info!(
                max_entries = settings.max_entries,
                "rotated log after exceeding entry ceiling"
            );
        }

        if report.pruned_entries > 0 || needs_rotation {
            self.save(&mut log).await?;
            info!(
                pruned_entries = report.pruned_entries,
                rotated = report.rotated,
                "maintenance updated the log artifact"
            );
        }
        drop(_guard);

        report.pruned_backups = self.prune_backups().await?;
        Ok(report)
    }

    /// Remove backups beyond the configured ceiling, oldest first.
    pub async fn prune_backups(&self) -> Result<usize, StorageError> {
        let backups = self.list_backups().await?;
        let max_backups = self.settings().max_backups;
        if backups.len() <= max_backups {
            return Ok(0);
        }
        let mut removed = 0;
        for stale in &backups[max_backups..] {
            match fs::remove_file(stale).await {
                Ok(()) => removed += 1,
                Err(err) => {
                    warn!(backup = ?stale, error = %err, "failed to remove stale backup");
                }
            }
        }
        if removed > 0 {
            info!(removed, kept = max_backups, "pruned old backups");
        }
        Ok(removed)
    }
}
