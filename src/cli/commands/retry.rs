use anyhow::Result;

use super::parse_entry_id;
use crate::workflow::ReceiptWorkflow;

pub async fn run(engine: &ReceiptWorkflow, id: String) -> Result<()> {
    let id = parse_entry_id(&id)?;
    let entry = engine
        .retry(id, Some("manual retry from CLI".to_string()))
        .await?;
    println!(
        "🔁 {} queued for reprocessing (attempt {})",
        entry.id, entry.retry_count
    );
    Ok(())
}
