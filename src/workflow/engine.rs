use rust_decimal::Decimal;
use std::path::PathBuf;
use tracing::{info, warn};
use uuid::Uuid;

use super::categorize::categorize_error;
use super::events::{
    AmountMismatch, BulkUpdateReport, ExtractionOutcome, PaymentReconciliation, PaymentUpdate,
};
use super::{WorkflowError, WorkflowSettings};
use crate::model::{EntryFilter, LogFile, ReceiptLogEntry, StatusTransition};
use crate::report::ProcessingStats;
use crate::status::{validate_transition, ProcessingStatus, TransitionRecorder};
use crate::storage::{JsonStorageManager, LogPersistence};

/// Orchestrates workflow transitions: the only place that combines state
/// machine validation, transition recording and storage persistence into a
/// single all-or-nothing operation per external event.
///
/// Every mutating operation reloads the log under the exclusive storage
/// lock, validates the requested edge, records the transition and saves
/// atomically. A failure at any step leaves the persisted artifact
/// unchanged; the in-memory mutation is provisional until the save
/// returns.
pub struct ReceiptWorkflow {
    storage: JsonStorageManager,
    settings: WorkflowSettings,
}

impl ReceiptWorkflow {
    pub fn new(storage: JsonStorageManager, settings: WorkflowSettings) -> Self {
        Self { storage, settings }
    }

    pub fn storage(&self) -> &JsonStorageManager {
        &self.storage
    }

    /// Track a newly detected receipt file as a `pending` entry.
    pub async fn register_receipt(
        &self,
        original_filename: String,
        file_path: PathBuf,
        file_size: u64,
    ) -> Result<ReceiptLogEntry, WorkflowError> {
        let entry = self
            .storage
            .with_exclusive(move |log| {
                let entry = ReceiptLogEntry::new(original_filename, file_path, file_size);
                log.entries.push(entry.clone());
                Ok::<_, WorkflowError>(entry)
            })
            .await?;
        info!(
            entry_id = %entry.id,
            filename = %entry.original_filename,
            "registered new receipt"
        );
        Ok(entry)
    }

    /// `pending -> processing`, fired when extraction is handed off.
    pub async fn begin_processing(&self, id: Uuid) -> Result<ReceiptLogEntry, WorkflowError> {
        self.transition(id, ProcessingStatus::Processing, true, None, None, |_| {})
            .await
    }

    /// Classify the extraction result the AI collaborator handed back:
    /// failure → `error`, usable data at or above the confidence
    /// threshold → `processed`, anything else → `no_data_extracted`.
    pub async fn complete_processing(
        &self,
        id: Uuid,
        outcome: ExtractionOutcome,
    ) -> Result<ReceiptLogEntry, WorkflowError> {
        if let Some(data) = &outcome.data {
            if !(0.0..=1.0).contains(&data.confidence_score) {
                return Err(WorkflowError::Validation {
                    reason: format!(
                        "confidence score {} is outside [0, 1]",
                        data.confidence_score
                    ),
                });
            }
        }

        if !outcome.success {
            let message = outcome
                .error
                .unwrap_or_else(|| "extraction failed".to_string());
            let category = categorize_error(&message);
            let notes = format!("extraction failed, category={category}");
            return self
                .transition(
                    id,
                    ProcessingStatus::Error,
                    true,
                    None,
                    Some(notes),
                    move |entry| {
                        entry.error_message = Some(message);
                    },
                )
                .await;
        }

        let processing_time = outcome.processing_time;
        match outcome.data {
            Some(data)
                if data.has_required_data()
                    && data.confidence_score >= self.settings.confidence_threshold =>
            {
                let notes = format!("extraction confidence {:.2}", data.confidence_score);
                self.transition(
                    id,
                    ProcessingStatus::Processed,
                    true,
                    None,
                    Some(notes),
                    move |entry| {
                        entry.new_filename = Some(data.suggested_filename());
                        entry.receipt_data = Some(data);
                        entry.processing_time = processing_time;
                        entry.error_message = None;
                    },
                )
                .await
            }
            data => {
                let notes = match &data {
                    Some(data) if !data.has_required_data() => {
                        "extraction succeeded but required fields are missing".to_string()
                    }
                    Some(data) => format!(
                        "extraction confidence {:.2} below threshold {:.2}",
                        data.confidence_score, self.settings.confidence_threshold
                    ),
                    None => "extraction returned no data".to_string(),
                };
                // Earlier extracted data, if any, is deliberately left in
                // place until a later successful pass overwrites it.
                self.transition(
                    id,
                    ProcessingStatus::NoDataExtracted,
                    true,
                    None,
                    Some(notes),
                    move |entry| {
                        entry.processing_time = processing_time;
                    },
                )
                .await
            }
        }
    }

    /// `error|no_data_extracted -> retry -> processing`, one
    /// `retry_count` increment. Rejected with `RetryLimitExceeded` once
    /// the ceiling is reached; the entry stays put for manual
    /// intervention.
    pub async fn retry(
        &self,
        id: Uuid,
        user_action: Option<String>,
    ) -> Result<ReceiptLogEntry, WorkflowError> {
        let max_retries = self.settings.max_retries;
        let automated = user_action.is_none();
        let entry = self
            .storage
            .with_exclusive(move |log| {
                let Some((entry, transitions)) = log.entry_and_transitions_mut(id) else {
                    return Err(WorkflowError::UnknownEntry(id));
                };
                validate_transition(entry.status, ProcessingStatus::Retry)?;
                if entry.retry_count >= max_retries {
                    return Err(WorkflowError::RetryLimitExceeded {
                        id,
                        limit: max_retries,
                    });
                }
                TransitionRecorder::record(
                    entry,
                    transitions,
                    ProcessingStatus::Retry,
                    automated,
                    user_action.clone(),
                    None,
                );
                TransitionRecorder::record(
                    entry,
                    transitions,
                    ProcessingStatus::Processing,
                    automated,
                    user_action,
                    Some(format!("retry attempt {}", entry.retry_count + 1)),
                );
                entry.retry_count += 1;
                Ok(entry.clone())
            })
            .await?;
        info!(
            entry_id = %entry.id,
            retry_count = entry.retry_count,
            "retrying extraction"
        );
        Ok(entry)
    }

    /// `processed -> emailed`, with the recipient and send time the email
    /// collaborator reported.
    pub async fn mark_emailed(
        &self,
        id: Uuid,
        recipient: String,
        sent_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<ReceiptLogEntry, WorkflowError> {
        self.transition(
            id,
            ProcessingStatus::Emailed,
            true,
            None,
            Some(format!("emailed to {recipient}")),
            move |entry| {
                entry.email_recipient = Some(recipient);
                entry.email_sent_at = Some(sent_at);
            },
        )
        .await
    }

    /// `emailed -> submitted`. The payment system is a tag recorded in the
    /// audit notes, not workflow state.
    pub async fn mark_submitted(
        &self,
        id: Uuid,
        payment_system: String,
    ) -> Result<ReceiptLogEntry, WorkflowError> {
        self.transition(
            id,
            ProcessingStatus::Submitted,
            false,
            Some(format!("submitted via {payment_system}")),
            None,
            |_| {},
        )
        .await
    }

    /// `submitted -> payment_received`. A non-positive amount is rejected
    /// before any mutation; a mismatch against the extracted total is
    /// flagged for the report layer but does not block the transition.
    pub async fn mark_payment_received(
        &self,
        id: Uuid,
        update: PaymentUpdate,
    ) -> Result<PaymentReconciliation, WorkflowError> {
        if update.amount <= Decimal::ZERO {
            return Err(WorkflowError::Validation {
                reason: format!("payment amount must be positive, got {}", update.amount),
            });
        }

        let reconciliation = self
            .storage
            .with_exclusive(move |log| {
                let Some((entry, transitions)) = log.entry_and_transitions_mut(id) else {
                    return Err(WorkflowError::UnknownEntry(id));
                };
                validate_transition(entry.status, ProcessingStatus::PaymentReceived)?;

                let expected = entry
                    .receipt_data
                    .as_ref()
                    .and_then(|data| data.total_amount);
                let mismatch = match expected {
                    Some(expected) if expected != update.amount => Some(AmountMismatch {
                        expected,
                        received: update.amount,
                    }),
                    _ => None,
                };
                let notes = match &mismatch {
                    Some(m) => format!(
                        "payment of {} via {} does not match extracted total {}",
                        m.received, update.payment_system, m.expected
                    ),
                    None => format!("payment of {} via {}", update.amount, update.payment_system),
                };

                TransitionRecorder::record(
                    entry,
                    transitions,
                    ProcessingStatus::PaymentReceived,
                    true,
                    None,
                    Some(notes),
                );
                entry.payment_amount = Some(update.amount);
                entry.payment_received_at = Some(update.timestamp);
                Ok(PaymentReconciliation {
                    entry: entry.clone(),
                    mismatch,
                })
            })
            .await?;

        if let Some(mismatch) = &reconciliation.mismatch {
            warn!(
                entry_id = %id,
                expected = %mismatch.expected,
                received = %mismatch.received,
                "payment amount mismatch flagged"
            );
        }
        Ok(reconciliation)
    }

    /// Apply the same manual transition to many entries. Outcomes are
    /// independent per entry: invalid ones are rejected and untouched,
    /// valid ones are recorded, and the batch persists in one save.
    pub async fn bulk_update(
        &self,
        ids: Vec<Uuid>,
        to_status: ProcessingStatus,
        user_action: Option<String>,
    ) -> Result<BulkUpdateReport, WorkflowError> {
        let report = self
            .storage
            .with_exclusive(move |log| {
                let mut report = BulkUpdateReport::default();
                for id in ids {
                    let Some((entry, transitions)) = log.entry_and_transitions_mut(id) else {
                        report.rejected.push((id, WorkflowError::UnknownEntry(id)));
                        continue;
                    };
                    if let Err(rejection) = validate_transition(entry.status, to_status) {
                        report.rejected.push((id, rejection.into()));
                        continue;
                    }
                    TransitionRecorder::record(
                        entry,
                        transitions,
                        to_status,
                        false,
                        user_action.clone(),
                        None,
                    );
                    report.applied.push(id);
                }
                Ok::<_, WorkflowError>(report)
            })
            .await?;
        info!(
            to_status = %to_status,
            applied = report.applied.len(),
            rejected = report.rejected.len(),
            "bulk status update finished"
        );
        Ok(report)
    }

    /// Fetch one entry by id.
    pub async fn entry(&self, id: Uuid) -> Result<ReceiptLogEntry, WorkflowError> {
        let log = self.storage.load().await?;
        log.entry(id)
            .cloned()
            .ok_or(WorkflowError::UnknownEntry(id))
    }

    /// Full audit trail for one entry, oldest first.
    pub async fn audit_trail(&self, id: Uuid) -> Result<Vec<StatusTransition>, WorkflowError> {
        let log = self.storage.load().await?;
        if log.entry(id).is_none() {
            return Err(WorkflowError::UnknownEntry(id));
        }
        Ok(log.transitions_for(id).into_iter().cloned().collect())
    }

    /// Entries matching a read-only filter.
    pub async fn find(&self, filter: &EntryFilter) -> Result<Vec<ReceiptLogEntry>, WorkflowError> {
        let log = self.storage.load().await?;
        Ok(log.find(filter).into_iter().cloned().collect())
    }

    /// Current full log snapshot.
    pub async fn snapshot(&self) -> Result<LogFile, WorkflowError> {
        Ok(self.storage.load().await?)
    }

    /// Aggregates for the report layer, recomputed on demand.
    pub async fn statistics(&self) -> Result<ProcessingStats, WorkflowError> {
        let log = self.storage.load().await?;
        Ok(ProcessingStats::compute(&log))
    }

    /// Shared skeleton for single-edge operations: resolve, validate,
    /// record, apply `update`, save, all inside the lock scope.
    async fn transition(
        &self,
        id: Uuid,
        to_status: ProcessingStatus,
        automated: bool,
        user_action: Option<String>,
        notes: Option<String>,
        update: impl FnOnce(&mut ReceiptLogEntry),
    ) -> Result<ReceiptLogEntry, WorkflowError> {
        let entry = self
            .storage
            .with_exclusive(move |log| {
                let Some((entry, transitions)) = log.entry_and_transitions_mut(id) else {
                    return Err(WorkflowError::UnknownEntry(id));
                };
                validate_transition(entry.status, to_status)?;
                let transition = TransitionRecorder::record(
                    entry,
                    transitions,
                    to_status,
                    automated,
                    user_action,
                    notes,
                );
                update(entry);
                info!(
                    entry_id = %id,
                    from = %transition.from_status,
                    to = %transition.to_status,
                    "status transition recorded"
                );
                Ok(entry.clone())
            })
            .await?;
        Ok(entry)
    }
}
