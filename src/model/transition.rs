use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::status::ProcessingStatus;

/// One recorded status change. Append-only: once written to the log a
/// transition is never mutated, so the sequence doubles as the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusTransition {
    /// Back-reference to the entry this transition belongs to.
    pub entry_id: Uuid,
    pub from_status: ProcessingStatus,
    pub to_status: ProcessingStatus,
    pub timestamp: DateTime<Utc>,
    /// Free text describing a manual trigger, when one caused this change.
    pub user_action: Option<String>,
    pub automated: bool,
    pub notes: Option<String>,
}
