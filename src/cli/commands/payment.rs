use anyhow::Result;

use super::{parse_amount, parse_entry_id, parse_timestamp};
use crate::workflow::{PaymentUpdate, ReceiptWorkflow};

pub async fn run(
    engine: &ReceiptWorkflow,
    id: String,
    amount: String,
    system: String,
    received_at: Option<String>,
) -> Result<()> {
    let id = parse_entry_id(&id)?;
    let update = PaymentUpdate {
        amount: parse_amount(&amount)?,
        timestamp: parse_timestamp(received_at)?,
        payment_system: system,
    };

    let reconciliation = engine.mark_payment_received(id, update).await?;
    println!(
        "💰 {} payment recorded: {}",
        reconciliation.entry.id,
        reconciliation
            .entry
            .payment_amount
            .map(|a| a.to_string())
            .unwrap_or_default()
    );
    if let Some(mismatch) = &reconciliation.mismatch {
        println!(
            "⚠️  amount mismatch: extracted total {}, received {}",
            mismatch.expected, mismatch.received
        );
    }
    Ok(())
}
