use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

pub mod audit;
pub mod cleanup;
pub mod email;
pub mod logs;
pub mod payment;
pub mod report;
pub mod retry;
pub mod submit;
pub mod track;
pub mod update_status;

pub(crate) fn parse_entry_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| anyhow!("'{raw}' is not a valid entry id"))
}

pub(crate) fn parse_amount(raw: &str) -> Result<Decimal> {
    raw.parse()
        .map_err(|_| anyhow!("'{raw}' is not a valid decimal amount"))
}

/// RFC 3339 timestamp, defaulting to now when absent.
pub(crate) fn parse_timestamp(raw: Option<String>) -> Result<DateTime<Utc>> {
    match raw {
        None => Ok(Utc::now()),
        Some(raw) => DateTime::parse_from_rfc3339(&raw)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(|_| anyhow!("'{raw}' is not an RFC 3339 timestamp")),
    }
}
