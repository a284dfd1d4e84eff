use anyhow::Result;
use clap::Parser;

use receipt_ledger::cli::{self, Cli};
use receipt_ledger::config::ReceiptLedgerConfig;
use receipt_ledger::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    ReceiptLedgerConfig::load_env_file()?;
    let config = ReceiptLedgerConfig::load()?;
    init_telemetry(&config.observability)?;

    let cli = Cli::parse();
    cli::run(cli, config).await
}
