// Receipt Ledger - receipt workflow tracking with an audited JSON log
// This exposes the core components for testing and integration

pub mod cli;
pub mod config;
pub mod model;
pub mod report;
pub mod status;
pub mod storage;
pub mod telemetry;
pub mod workflow;

// Re-export key types for easy access
pub use config::{ObservabilityConfig, ReceiptLedgerConfig};
pub use model::{Currency, EntryFilter, LogFile, LogMetadata, ReceiptData, ReceiptLogEntry, StatusTransition};
pub use report::ProcessingStats;
pub use status::{
    is_legal_transition, validate_transition, ProcessingStatus, TransitionRecorder,
    TransitionRejection,
};
pub use storage::{
    JsonStorageManager, LogPersistence, MaintenanceReport, StorageError, StorageSettings,
};
pub use telemetry::init_telemetry;
pub use workflow::{
    AmountMismatch, BulkUpdateReport, ExtractionOutcome, PaymentReconciliation, PaymentUpdate,
    ReceiptWorkflow, WorkflowError, WorkflowSettings,
};
