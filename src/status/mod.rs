use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub mod recorder;

pub use recorder::TransitionRecorder;

/// Workflow status of a tracked receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    Pending,
    Processing,
    Error,
    NoDataExtracted,
    Processed,
    Emailed,
    Submitted,
    PaymentReceived,
    Retry,
}

impl ProcessingStatus {
    pub const ALL: [ProcessingStatus; 9] = [
        ProcessingStatus::Pending,
        ProcessingStatus::Processing,
        ProcessingStatus::Error,
        ProcessingStatus::NoDataExtracted,
        ProcessingStatus::Processed,
        ProcessingStatus::Emailed,
        ProcessingStatus::Submitted,
        ProcessingStatus::PaymentReceived,
        ProcessingStatus::Retry,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::Pending => "pending",
            ProcessingStatus::Processing => "processing",
            ProcessingStatus::Error => "error",
            ProcessingStatus::NoDataExtracted => "no_data_extracted",
            ProcessingStatus::Processed => "processed",
            ProcessingStatus::Emailed => "emailed",
            ProcessingStatus::Submitted => "submitted",
            ProcessingStatus::PaymentReceived => "payment_received",
            ProcessingStatus::Retry => "retry",
        }
    }

    /// Legal targets from this status. The entire edge set lives here;
    /// every transition in the system is checked against this table.
    pub fn legal_targets(&self) -> &'static [ProcessingStatus] {
        match self {
            ProcessingStatus::Pending => &[ProcessingStatus::Processing],
            ProcessingStatus::Processing => &[
                ProcessingStatus::Error,
                ProcessingStatus::NoDataExtracted,
                ProcessingStatus::Processed,
            ],
            ProcessingStatus::Error => &[ProcessingStatus::Retry],
            ProcessingStatus::NoDataExtracted => &[ProcessingStatus::Retry],
            ProcessingStatus::Retry => &[ProcessingStatus::Processing],
            ProcessingStatus::Processed => &[ProcessingStatus::Emailed],
            ProcessingStatus::Emailed => &[ProcessingStatus::Submitted],
            ProcessingStatus::Submitted => &[ProcessingStatus::PaymentReceived],
            ProcessingStatus::PaymentReceived => &[],
        }
    }

    /// A status with no outgoing edges.
    pub fn is_terminal(&self) -> bool {
        self.legal_targets().is_empty()
    }

    /// Statuses an entry can leave again via `retry`.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ProcessingStatus::Error | ProcessingStatus::NoDataExtracted
        )
    }
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ProcessingStatus {
    type Err = TransitionRejection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProcessingStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| TransitionRejection::UnknownState {
                name: s.to_string(),
            })
    }
}

/// Typed reasons a requested transition is rejected, so callers can decide
/// whether to surface the failure to a user or only to a log.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionRejection {
    #[error("no status named '{name}'")]
    UnknownState { name: String },
    #[error("transition {from} -> {to} is not a legal edge (valid next: {})", format_targets(.from.legal_targets()))]
    IllegalEdge {
        from: ProcessingStatus,
        to: ProcessingStatus,
    },
    #[error("{status} is a terminal status, no further transitions are allowed")]
    TerminalState { status: ProcessingStatus },
}

fn format_targets(targets: &[ProcessingStatus]) -> String {
    targets
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Pure check against the edge table.
pub fn is_legal_transition(from: ProcessingStatus, to: ProcessingStatus) -> bool {
    from.legal_targets().contains(&to)
}

/// Validate a requested edge, returning the specific rejection reason.
pub fn validate_transition(
    from: ProcessingStatus,
    to: ProcessingStatus,
) -> Result<(), TransitionRejection> {
    if from.is_terminal() {
        return Err(TransitionRejection::TerminalState { status: from });
    }
    if !is_legal_transition(from, to) {
        return Err(TransitionRejection::IllegalEdge { from, to });
    }
    Ok(())
}
