use anyhow::Result;

use super::parse_entry_id;
use crate::workflow::ReceiptWorkflow;

pub async fn run(engine: &ReceiptWorkflow, id: String, system: String) -> Result<()> {
    let id = parse_entry_id(&id)?;
    let entry = engine.mark_submitted(id, system.clone()).await?;
    println!("📨 {} submitted via {system}", entry.id);
    Ok(())
}
