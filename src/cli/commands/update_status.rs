use anyhow::Result;

use super::parse_entry_id;
use crate::status::ProcessingStatus;
use crate::workflow::ReceiptWorkflow;

pub async fn run(
    engine: &ReceiptWorkflow,
    ids: Vec<String>,
    to: String,
    action: Option<String>,
) -> Result<()> {
    let to_status: ProcessingStatus = to.parse()?;
    let ids = ids
        .iter()
        .map(|raw| parse_entry_id(raw))
        .collect::<Result<Vec<_>>>()?;

    let report = engine.bulk_update(ids, to_status, action).await?;

    for id in &report.applied {
        println!("✅ {id} -> {to_status}");
    }
    for (id, err) in &report.rejected {
        println!("⚠️  {id}: {err}");
    }
    if !report.is_complete_success() {
        anyhow::bail!(
            "{} of {} updates rejected",
            report.rejected.len(),
            report.applied.len() + report.rejected.len()
        );
    }
    Ok(())
}
