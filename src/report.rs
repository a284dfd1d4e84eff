use serde::Serialize;
use std::collections::BTreeMap;

use crate::model::LogFile;

/// Aggregates over a log snapshot, recomputed on demand for the report
/// layer. Derived data only; nothing here feeds back into the log.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingStats {
    pub total_receipts: usize,
    pub by_status: BTreeMap<String, usize>,
    pub successful: usize,
    pub failed: usize,
    pub total_transitions: usize,
    pub average_processing_time: Option<f64>,
    pub min_processing_time: Option<f64>,
    pub max_processing_time: Option<f64>,
}

impl ProcessingStats {
    pub fn compute(log: &LogFile) -> Self {
        let mut by_status = BTreeMap::new();
        for entry in &log.entries {
            *by_status
                .entry(entry.status.as_str().to_string())
                .or_insert(0) += 1;
        }

        let times: Vec<f64> = log
            .entries
            .iter()
            .filter_map(|entry| entry.processing_time)
            .collect();
        let average = if times.is_empty() {
            None
        } else {
            Some(times.iter().sum::<f64>() / times.len() as f64)
        };
        let min = times.iter().copied().reduce(f64::min);
        let max = times.iter().copied().reduce(f64::max);

        Self {
            total_receipts: log.entries.len(),
            by_status,
            successful: log.entries.iter().filter(|e| e.is_successful()).count(),
            failed: log.entries.iter().filter(|e| e.is_failed()).count(),
            total_transitions: log.transitions.len(),
            average_processing_time: average,
            min_processing_time: min,
            max_processing_time: max,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ReceiptLogEntry;
    use crate::status::ProcessingStatus;
    use std::path::PathBuf;

    fn entry_with(status: ProcessingStatus, time: Option<f64>) -> ReceiptLogEntry {
        let mut entry = ReceiptLogEntry::new(
            "scan.png".to_string(),
            PathBuf::from("/receipts/scan.png"),
            1,
        );
        entry.status = status;
        entry.processing_time = time;
        entry
    }

    #[test]
    fn test_stats_over_mixed_entries() {
        let mut log = LogFile::empty();
        log.entries
            .push(entry_with(ProcessingStatus::Processed, Some(2.0)));
        log.entries
            .push(entry_with(ProcessingStatus::Error, Some(6.0)));
        log.entries.push(entry_with(ProcessingStatus::Pending, None));

        let stats = ProcessingStats::compute(&log);
        assert_eq!(stats.total_receipts, 3);
        assert_eq!(stats.successful, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.by_status.get("pending"), Some(&1));
        assert_eq!(stats.average_processing_time, Some(4.0));
        assert_eq!(stats.min_processing_time, Some(2.0));
        assert_eq!(stats.max_processing_time, Some(6.0));
    }

    #[test]
    fn test_stats_on_empty_log() {
        let stats = ProcessingStats::compute(&LogFile::empty());
        assert_eq!(stats.total_receipts, 0);
        assert!(stats.average_processing_time.is_none());
    }
}
