use anyhow::Result;

use super::{parse_entry_id, parse_timestamp};
use crate::workflow::ReceiptWorkflow;

pub async fn run(
    engine: &ReceiptWorkflow,
    id: String,
    recipient: String,
    sent_at: Option<String>,
) -> Result<()> {
    let id = parse_entry_id(&id)?;
    let sent_at = parse_timestamp(sent_at)?;
    let entry = engine.mark_emailed(id, recipient, sent_at).await?;
    println!(
        "📧 {} marked emailed to {}",
        entry.id,
        entry.email_recipient.as_deref().unwrap_or("?")
    );
    Ok(())
}
