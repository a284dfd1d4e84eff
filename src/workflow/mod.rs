use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::status::TransitionRejection;
use crate::storage::StorageError;

pub mod categorize;
pub mod engine;
pub mod events;

pub use categorize::{categorize_error, ErrorCategory};
pub use engine::ReceiptWorkflow;
pub use events::{
    AmountMismatch, BulkUpdateReport, ExtractionOutcome, PaymentReconciliation, PaymentUpdate,
};

/// Tuning for the workflow engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowSettings {
    /// Retry ceiling for entries in a recoverable status.
    pub max_retries: u32,
    /// Minimum extraction confidence accepted as `processed`.
    pub confidence_threshold: f64,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            confidence_threshold: 0.8,
        }
    }
}

/// Errors surfaced by workflow operations. All of these are local,
/// recoverable-by-caller conditions; none should crash the process.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("no log entry with id {0}")]
    UnknownEntry(Uuid),

    #[error(transparent)]
    IllegalTransition(#[from] TransitionRejection),

    #[error("retry limit reached for entry {id}: all {limit} attempts used")]
    RetryLimitExceeded { id: Uuid, limit: u32 },

    #[error("validation failed: {reason}")]
    Validation { reason: String },

    #[error(transparent)]
    Storage(#[from] StorageError),
}
