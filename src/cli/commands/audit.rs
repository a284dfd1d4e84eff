use anyhow::Result;

use super::parse_entry_id;
use crate::workflow::ReceiptWorkflow;

pub async fn run(engine: &ReceiptWorkflow, id: String) -> Result<()> {
    let id = parse_entry_id(&id)?;
    let trail = engine.audit_trail(id).await?;

    if trail.is_empty() {
        println!("No transitions recorded for {id} yet.");
        return Ok(());
    }

    for transition in trail {
        let trigger = if transition.automated {
            "auto".to_string()
        } else {
            transition
                .user_action
                .clone()
                .unwrap_or_else(|| "manual".to_string())
        };
        let notes = transition.notes.as_deref().unwrap_or("");
        println!(
            "{}  {} -> {}  [{}]  {}",
            transition.timestamp.to_rfc3339(),
            transition.from_status,
            transition.to_status,
            trigger,
            notes
        );
    }
    Ok(())
}
