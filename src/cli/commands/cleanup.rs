use anyhow::Result;

use crate::workflow::ReceiptWorkflow;

pub async fn run(engine: &ReceiptWorkflow) -> Result<()> {
    let report = engine.storage().run_maintenance().await?;
    println!(
        "🧹 Maintenance complete: {} entries pruned, {} backups pruned{}",
        report.pruned_entries,
        report.pruned_backups,
        if report.rotated { ", log rotated" } else { "" }
    );
    Ok(())
}
