use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::WorkflowError;
use crate::model::{ReceiptData, ReceiptLogEntry};

/// Result handed back by the AI vision collaborator. The engine only
/// classifies it; extraction mechanics (and their timeouts) live outside.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionOutcome {
    pub success: bool,
    pub data: Option<ReceiptData>,
    pub error: Option<String>,
    /// Seconds the extraction attempt took, when the collaborator tracked it.
    pub processing_time: Option<f64>,
}

impl ExtractionOutcome {
    pub fn extracted(data: ReceiptData, processing_time: Option<f64>) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            processing_time,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            processing_time: None,
        }
    }
}

/// Payment event from whichever payment system is in use; the system
/// itself is just a tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentUpdate {
    pub amount: Decimal,
    pub timestamp: DateTime<Utc>,
    pub payment_system: String,
}

/// Recorded payment amount differing from the extracted total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmountMismatch {
    pub expected: Decimal,
    pub received: Decimal,
}

/// Outcome of `mark_payment_received`: the updated entry plus a mismatch
/// flag for the report layer. A mismatch never blocks the transition.
#[derive(Debug, Clone)]
pub struct PaymentReconciliation {
    pub entry: ReceiptLogEntry,
    pub mismatch: Option<AmountMismatch>,
}

/// Per-id outcomes of a bulk manual update. Entries are independent;
/// partial success across the batch is expected and reported, not rolled
/// back.
#[derive(Debug, Default)]
pub struct BulkUpdateReport {
    pub applied: Vec<Uuid>,
    pub rejected: Vec<(Uuid, WorkflowError)>,
}

impl BulkUpdateReport {
    pub fn is_complete_success(&self) -> bool {
        self.rejected.is_empty()
    }
}
