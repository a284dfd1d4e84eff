use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::HashSet;
use uuid::Uuid;

use super::entry::ReceiptLogEntry;
use super::transition::StatusTransition;
use crate::status::ProcessingStatus;

/// The whole persisted log: every tracked entry plus the append-only audit
/// trail of their transitions. Serialized field names (`logs`,
/// `status_transitions`) are a compatibility surface with existing log
/// files and must not change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogFile {
    #[serde(rename = "logs")]
    pub entries: Vec<ReceiptLogEntry>,
    #[serde(rename = "status_transitions")]
    pub transitions: Vec<StatusTransition>,
    /// Derived counts, recomputed on every save. Never a source of truth.
    pub metadata: LogMetadata,
    pub last_updated: DateTime<Utc>,
}

/// Aggregate counts derived from `entries`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogMetadata {
    pub total_receipts: usize,
    pub successful_extractions: usize,
    pub failed_extractions: usize,
    pub by_status: BTreeMap<String, usize>,
}

impl LogFile {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            transitions: Vec::new(),
            metadata: LogMetadata::default(),
            last_updated: Utc::now(),
        }
    }

    pub fn entry(&self, id: Uuid) -> Option<&ReceiptLogEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn entry_mut(&mut self, id: Uuid) -> Option<&mut ReceiptLogEntry> {
        self.entries.iter_mut().find(|entry| entry.id == id)
    }

    /// Entry and the transition sequence as disjoint mutable borrows, for
    /// the recorder to apply a change to both in one operation.
    pub fn entry_and_transitions_mut(
        &mut self,
        id: Uuid,
    ) -> Option<(&mut ReceiptLogEntry, &mut Vec<StatusTransition>)> {
        let entry = self.entries.iter_mut().find(|entry| entry.id == id)?;
        Some((entry, &mut self.transitions))
    }

    /// Full audit trail for one entry, in recorded (chronological) order.
    pub fn transitions_for(&self, id: Uuid) -> Vec<&StatusTransition> {
        self.transitions
            .iter()
            .filter(|t| t.entry_id == id)
            .collect()
    }

    pub fn by_status(&self, status: ProcessingStatus) -> Vec<&ReceiptLogEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.status == status)
            .collect()
    }

    /// Entries matching every populated field of `filter`.
    pub fn find(&self, filter: &EntryFilter) -> Vec<&ReceiptLogEntry> {
        self.entries
            .iter()
            .filter(|entry| filter.matches(entry))
            .collect()
    }

    /// Most recently created entries, newest first.
    pub fn recent(&self, limit: usize) -> Vec<&ReceiptLogEntry> {
        let mut sorted: Vec<&ReceiptLogEntry> = self.entries.iter().collect();
        sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        sorted.truncate(limit);
        sorted
    }

    /// Recompute the derived counts from the current entries.
    pub fn recompute_metadata(&mut self) {
        let mut by_status = BTreeMap::new();
        for entry in &self.entries {
            *by_status.entry(entry.status.as_str().to_string()).or_insert(0) += 1;
        }
        self.metadata = LogMetadata {
            total_receipts: self.entries.len(),
            successful_extractions: self.entries.iter().filter(|e| e.is_successful()).count(),
            failed_extractions: self.entries.iter().filter(|e| e.is_failed()).count(),
            by_status,
        };
    }

    /// Drop entries created more than `max_age_days` ago, together with
    /// their transitions. Returns the number of entries removed. Used by
    /// storage maintenance, never by the workflow hot path.
    pub fn prune_older_than(&mut self, max_age_days: u32) -> usize {
        let cutoff = Utc::now() - Duration::days(i64::from(max_age_days));
        let before = self.entries.len();
        self.entries.retain(|entry| entry.created_at > cutoff);
        let kept: HashSet<Uuid> = self.entries.iter().map(|entry| entry.id).collect();
        self.transitions.retain(|t| kept.contains(&t.entry_id));
        before - self.entries.len()
    }
}

/// Read-only query filter over the entry collection.
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    pub statuses: Option<HashSet<ProcessingStatus>>,
    /// Case-insensitive substring match against the extracted vendor name.
    pub vendor: Option<String>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
}

impl EntryFilter {
    pub fn matches(&self, entry: &ReceiptLogEntry) -> bool {
        if let Some(statuses) = &self.statuses {
            if !statuses.contains(&entry.status) {
                return false;
            }
        }
        if let Some(vendor) = &self.vendor {
            let needle = vendor.to_lowercase();
            match entry.vendor_name() {
                Some(name) if name.to_lowercase().contains(&needle) => {}
                _ => return false,
            }
        }
        if let Some(after) = self.created_after {
            if entry.created_at < after {
                return false;
            }
        }
        if let Some(before) = self.created_before {
            if entry.created_at > before {
                return false;
            }
        }
        true
    }
}
