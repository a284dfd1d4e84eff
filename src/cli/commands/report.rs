use anyhow::Result;

use crate::workflow::ReceiptWorkflow;

pub async fn run(engine: &ReceiptWorkflow, json: bool) -> Result<()> {
    let stats = engine.statistics().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("📊 Receipt processing report");
    println!("   total receipts: {}", stats.total_receipts);
    println!("   successful:     {}", stats.successful);
    println!("   failed:         {}", stats.failed);
    println!("   transitions:    {}", stats.total_transitions);
    if !stats.by_status.is_empty() {
        println!("   by status:");
        for (status, count) in &stats.by_status {
            println!("     {status:<18} {count}");
        }
    }
    if let Some(avg) = stats.average_processing_time {
        println!(
            "   processing time: avg {:.2}s, min {:.2}s, max {:.2}s",
            avg,
            stats.min_processing_time.unwrap_or(avg),
            stats.max_processing_time.unwrap_or(avg)
        );
    }
    Ok(())
}
