use chrono::{Duration, Utc};

use super::ProcessingStatus;
use crate::model::{ReceiptLogEntry, StatusTransition};

/// Appends audit records for status changes.
///
/// The recorder assumes the edge was already validated by the state machine;
/// it only records. Recording is a pure in-memory mutation with no failure
/// mode of its own; persistence is the storage manager's job, invoked by
/// the workflow engine afterwards.
pub struct TransitionRecorder;

impl TransitionRecorder {
    /// Record a transition for `entry` and append it to `transitions`.
    ///
    /// Captures a timestamp that is strictly greater than any prior
    /// transition timestamp for the same entry, so ordering by timestamp
    /// stays total even when two transitions land within clock resolution.
    /// Mutates the entry's `status`, `updated_at`, and the milestone field
    /// matching `to_status` in the same logical operation.
    pub fn record(
        entry: &mut ReceiptLogEntry,
        transitions: &mut Vec<StatusTransition>,
        to_status: ProcessingStatus,
        automated: bool,
        user_action: Option<String>,
        notes: Option<String>,
    ) -> StatusTransition {
        let mut timestamp = Utc::now();
        if let Some(last) = transitions.iter().rev().find(|t| t.entry_id == entry.id) {
            if timestamp <= last.timestamp {
                timestamp = last.timestamp + Duration::microseconds(1);
            }
        }

        let transition = StatusTransition {
            entry_id: entry.id,
            from_status: entry.status,
            to_status,
            timestamp,
            user_action,
            automated,
            notes,
        };

        entry.status = to_status;
        entry.updated_at = timestamp;
        match to_status {
            ProcessingStatus::Emailed => entry.email_sent_at = Some(timestamp),
            ProcessingStatus::Submitted => entry.submitted_at = Some(timestamp),
            ProcessingStatus::PaymentReceived => entry.payment_received_at = Some(timestamp),
            _ => {}
        }

        transitions.push(transition.clone());
        transition
    }
}
