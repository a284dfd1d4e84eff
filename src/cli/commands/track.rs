use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::workflow::ReceiptWorkflow;

pub async fn run(engine: &ReceiptWorkflow, path: PathBuf) -> Result<()> {
    let metadata = tokio::fs::metadata(&path)
        .await
        .with_context(|| format!("cannot read receipt file {}", path.display()))?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let entry = engine
        .register_receipt(filename, path.clone(), metadata.len())
        .await?;

    println!("📄 Tracking {}", path.display());
    println!("   id: {}", entry.id);
    println!("   status: {}", entry.status);
    Ok(())
}
