use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use super::receipt::ReceiptData;
use crate::status::ProcessingStatus;

/// Full processing record for one tracked receipt file.
///
/// `status` is only ever changed through the transition recorder, which
/// keeps it equal to the `to_status` of the entry's latest transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptLogEntry {
    /// Opaque unique identifier, generated at creation. Immutable.
    pub id: Uuid,
    pub original_filename: String,
    pub file_path: PathBuf,
    pub file_size: u64,
    /// Set once renaming succeeds after extraction.
    pub new_filename: Option<String>,
    /// Extracted payload; overwritten only by a later successful
    /// reprocessing, never cleared.
    pub receipt_data: Option<ReceiptData>,
    pub status: ProcessingStatus,
    pub error_message: Option<String>,
    pub retry_count: u32,
    /// Seconds spent in the most recent extraction attempt.
    pub processing_time: Option<f64>,
    pub email_sent_at: Option<DateTime<Utc>>,
    pub email_recipient: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub payment_received_at: Option<DateTime<Utc>>,
    pub payment_amount: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReceiptLogEntry {
    /// New entry for a freshly detected receipt file, in the sole initial
    /// status `pending`.
    pub fn new(original_filename: String, file_path: PathBuf, file_size: u64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            original_filename,
            file_path,
            file_size,
            new_filename: None,
            receipt_data: None,
            status: ProcessingStatus::Pending,
            error_message: None,
            retry_count: 0,
            processing_time: None,
            email_sent_at: None,
            email_recipient: None,
            submitted_at: None,
            payment_received_at: None,
            payment_amount: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether processing got the entry past extraction successfully.
    pub fn is_successful(&self) -> bool {
        matches!(
            self.status,
            ProcessingStatus::Processed
                | ProcessingStatus::Emailed
                | ProcessingStatus::Submitted
                | ProcessingStatus::PaymentReceived
        )
    }

    pub fn is_failed(&self) -> bool {
        matches!(
            self.status,
            ProcessingStatus::Error | ProcessingStatus::NoDataExtracted
        )
    }

    pub fn vendor_name(&self) -> Option<&str> {
        self.receipt_data
            .as_ref()
            .and_then(|data| data.vendor_name.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entry_starts_pending() {
        let entry = ReceiptLogEntry::new(
            "scan_001.png".to_string(),
            PathBuf::from("/receipts/scan_001.png"),
            2048,
        );
        assert_eq!(entry.status, ProcessingStatus::Pending);
        assert_eq!(entry.retry_count, 0);
        assert!(entry.receipt_data.is_none());
        assert_eq!(entry.created_at, entry.updated_at);
    }

    #[test]
    fn test_success_and_failure_classification() {
        let mut entry = ReceiptLogEntry::new(
            "scan.png".to_string(),
            PathBuf::from("/receipts/scan.png"),
            1,
        );
        assert!(!entry.is_successful());
        assert!(!entry.is_failed());

        entry.status = ProcessingStatus::Emailed;
        assert!(entry.is_successful());

        entry.status = ProcessingStatus::NoDataExtracted;
        assert!(entry.is_failed());
    }
}
