use anyhow::Result;
use std::collections::HashSet;

use crate::model::EntryFilter;
use crate::status::ProcessingStatus;
use crate::workflow::ReceiptWorkflow;

pub async fn run(
    engine: &ReceiptWorkflow,
    status: Vec<String>,
    vendor: Option<String>,
    limit: usize,
) -> Result<()> {
    let statuses = if status.is_empty() {
        None
    } else {
        let parsed = status
            .iter()
            .map(|raw| raw.parse::<ProcessingStatus>())
            .collect::<Result<HashSet<_>, _>>()?;
        Some(parsed)
    };

    let filter = EntryFilter {
        statuses,
        vendor,
        ..EntryFilter::default()
    };
    let mut entries = engine.find(&filter).await?;
    entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    entries.truncate(limit);

    if entries.is_empty() {
        println!("No matching receipts.");
        return Ok(());
    }

    for entry in entries {
        let vendor = entry.vendor_name().unwrap_or("-").to_string();
        let amount = entry
            .receipt_data
            .as_ref()
            .and_then(|data| data.total_amount)
            .map(|a| a.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}  {:<17}  {:<24}  {:>10}  {}",
            entry.id, entry.status, vendor, amount, entry.original_filename
        );
    }
    Ok(())
}
