use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::model::LogFile;

pub mod rotation;

pub use rotation::MaintenanceReport;

/// Errors from the persistence layer.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("log file {path:?} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("could not acquire the storage lock within {waited_ms}ms")]
    LockTimeout { waited_ms: u64 },

    #[error("atomic rename onto {path:?} failed, durability cannot be guaranteed: {source}")]
    RenameFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("no usable backup found under {backup_dir:?}")]
    NoBackupAvailable { backup_dir: PathBuf },
}

/// Configuration for the JSON storage layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Path of the JSON log artifact.
    pub log_path: PathBuf,
    /// Directory receiving timestamped backups.
    pub backup_dir: PathBuf,
    /// Copy the previous artifact aside before every save.
    pub backup_on_save: bool,
    /// Bounded wait for the exclusive writer lock.
    pub lock_timeout_ms: u64,
    /// Backups kept by maintenance pruning.
    pub max_backups: usize,
    /// Entries older than this are pruned by maintenance.
    pub retention_days: u32,
    /// Entry count that triggers rotation during maintenance.
    pub max_entries: usize,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from(".receipt-ledger/receipt_log.json"),
            backup_dir: PathBuf::from(".receipt-ledger/backups"),
            backup_on_save: false,
            lock_timeout_ms: 5_000,
            max_backups: 10,
            retention_days: 180,
            max_entries: 10_000,
        }
    }
}

/// Persistence operations for the receipt log.
#[async_trait]
pub trait LogPersistence: Send + Sync {
    /// Read the artifact. An absent file is an empty log; a malformed one
    /// is an error, never silently discarded data.
    async fn load(&self) -> Result<LogFile, StorageError>;

    /// Persist the full log atomically, refreshing derived metadata and
    /// `last_updated`.
    async fn save(&self, log: &mut LogFile) -> Result<(), StorageError>;
}

/// Durable, crash-safe persistence of the [`LogFile`] to a single JSON
/// artifact with at-most-one-writer semantics.
///
/// Saves go through a temporary file in the same directory, fsync, then an
/// atomic rename: a concurrent reader or a crash mid-write observes either
/// the old complete file or the new complete file, never a partial one.
pub struct JsonStorageManager {
    settings: StorageSettings,
}

const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(25);

impl JsonStorageManager {
    pub fn new(settings: StorageSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &StorageSettings {
        &self.settings
    }

    pub fn log_path(&self) -> &Path {
        &self.settings.log_path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self
            .settings
            .log_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "receipt_log.json".to_string());
        name.push_str(".lock");
        self.settings.log_path.with_file_name(name)
    }

    fn temp_path(&self) -> PathBuf {
        let suffix = format!(
            "{}_{}",
            Utc::now().timestamp_micros(),
            rand::rng().random::<u32>()
        );
        let mut name = self
            .settings
            .log_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "receipt_log.json".to_string());
        name.push_str(&format!(".tmp.{suffix}"));
        self.settings.log_path.with_file_name(name)
    }

    fn open_lock_file(&self) -> Result<std::fs::File, StorageError> {
        if let Some(parent) = self.settings.log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(self.lock_path())?;
        Ok(file)
    }

    /// Run `mutate` on the current log under the exclusive writer lock and
    /// persist the result. The read-modify-write cycle always reloads from
    /// disk after the lock is held, so concurrent processes serialize
    /// cleanly. On any failure (lock wait exhausted, validation error in
    /// `mutate`, save failure) the persisted artifact is left unchanged.
    pub async fn with_exclusive<T, E, F>(&self, mutate: F) -> Result<T, E>
    where
        F: FnOnce(&mut LogFile) -> Result<T, E>,
        E: From<StorageError>,
    {
        let mut lock = fd_lock::RwLock::new(self.open_lock_file()?);
        let deadline = Instant::now() + Duration::from_millis(self.settings.lock_timeout_ms);
        let _guard = loop {
            match lock.try_write() {
                Ok(guard) => break guard,
                Err(err) if err.kind() == ErrorKind::WouldBlock => {
                    if Instant::now() >= deadline {
                        warn!(
                            lock = ?self.lock_path(),
                            timeout_ms = self.settings.lock_timeout_ms,
                            "gave up waiting for storage lock"
                        );
                        return Err(StorageError::LockTimeout {
                            waited_ms: self.settings.lock_timeout_ms,
                        }
                        .into());
                    }
                    tokio::time::sleep(LOCK_POLL_INTERVAL).await;
                }
                Err(err) => return Err(StorageError::Io(err).into()),
            }
        };

        let mut log = self.load().await?;
        let outcome = mutate(&mut log)?;
        self.save(&mut log).await?;
        Ok(outcome)
    }

    /// Timestamped copy of the current artifact into the backup directory.
    /// Returns `None` when there is nothing to back up yet.
    pub async fn create_backup(&self) -> Result<Option<PathBuf>, StorageError> {
        if fs::metadata(&self.settings.log_path).await.is_err() {
            return Ok(None);
        }
        fs::create_dir_all(&self.settings.backup_dir).await?;
        let backup_name = format!(
            "receipt_log_backup_{}.json",
            Utc::now().format("%Y%m%d_%H%M%S%.6f")
        );
        let backup_path = self.settings.backup_dir.join(backup_name);
        fs::copy(&self.settings.log_path, &backup_path).await?;
        info!(backup = ?backup_path, "created log backup");
        Ok(Some(backup_path))
    }

    /// Backup files, newest first. Backup names embed their timestamp, so
    /// reverse lexicographic order is reverse chronological order.
    pub async fn list_backups(&self) -> Result<Vec<PathBuf>, StorageError> {
        if fs::metadata(&self.settings.backup_dir).await.is_err() {
            return Ok(Vec::new());
        }
        let mut backups = Vec::new();
        let mut entries = fs::read_dir(&self.settings.backup_dir).await?;
        while let Some(dir_entry) = entries.next_entry().await? {
            let path = dir_entry.path();
            let is_backup = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("receipt_log_backup_") && n.ends_with(".json"));
            if is_backup {
                backups.push(path);
            }
        }
        backups.sort();
        backups.reverse();
        Ok(backups)
    }

    /// Fallback for a corrupt artifact: restore the most recent backup
    /// that parses, via the same temp+rename path as a normal save.
    pub async fn restore_latest_backup(&self) -> Result<PathBuf, StorageError> {
        for backup in self.list_backups().await? {
            let contents = fs::read_to_string(&backup).await?;
            if serde_json::from_str::<LogFile>(&contents).is_err() {
                warn!(backup = ?backup, "skipping unparseable backup");
                continue;
            }
            let temp = self.temp_path();
            let mut file = fs::File::create(&temp).await?;
            file.write_all(contents.as_bytes()).await?;
            file.sync_all().await?;
            drop(file);
            if let Err(source) = fs::rename(&temp, &self.settings.log_path).await {
                let _ = fs::remove_file(&temp).await;
                return Err(StorageError::RenameFailed {
                    path: self.settings.log_path.clone(),
                    source,
                });
            }
            info!(backup = ?backup, "restored log from backup");
            return Ok(backup);
        }
        Err(StorageError::NoBackupAvailable {
            backup_dir: self.settings.backup_dir.clone(),
        })
    }

    /// Whether the artifact currently parses as a log file.
    pub async fn verify_integrity(&self) -> Result<bool, StorageError> {
        match self.load().await {
            Ok(_) => Ok(true),
            Err(StorageError::Corrupt { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }
}

#[async_trait]
impl LogPersistence for JsonStorageManager {
    async fn load(&self) -> Result<LogFile, StorageError> {
        match fs::read_to_string(&self.settings.log_path).await {
            Ok(contents) => serde_json::from_str(&contents).map_err(|err| {
                warn!(
                    path = ?self.settings.log_path,
                    error = %err,
                    "log artifact failed to parse"
                );
                StorageError::Corrupt {
                    path: self.settings.log_path.clone(),
                    reason: err.to_string(),
                }
            }),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = ?self.settings.log_path, "no log artifact yet, starting empty");
                Ok(LogFile::empty())
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn save(&self, log: &mut LogFile) -> Result<(), StorageError> {
        if let Some(parent) = self.settings.log_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        if self.settings.backup_on_save {
            self.create_backup().await?;
        }

        log.recompute_metadata();
        log.last_updated = Utc::now();
        let serialized = serde_json::to_string_pretty(log)?;

        // Temp file in the same directory, flushed and fsynced, then an
        // atomic rename over the target. A crash at any point leaves either
        // the old or the new complete artifact.
        let temp = self.temp_path();
        let write_result = async {
            let mut file = fs::File::create(&temp).await?;
            file.write_all(serialized.as_bytes()).await?;
            file.sync_all().await?;
            Ok::<(), std::io::Error>(())
        }
        .await;
        if let Err(err) = write_result {
            let _ = fs::remove_file(&temp).await;
            return Err(err.into());
        }

        if let Err(source) = fs::rename(&temp, &self.settings.log_path).await {
            let _ = fs::remove_file(&temp).await;
            return Err(StorageError::RenameFailed {
                path: self.settings.log_path.clone(),
                source,
            });
        }

        debug!(
            path = ?self.settings.log_path,
            entries = log.entries.len(),
            transitions = log.transitions.len(),
            "log saved atomically"
        );
        Ok(())
    }
}
