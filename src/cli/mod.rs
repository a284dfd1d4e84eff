use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::ReceiptLedgerConfig;
use crate::storage::JsonStorageManager;
use crate::workflow::ReceiptWorkflow;

pub mod commands;

#[derive(Parser)]
#[command(name = "receipt-ledger")]
#[command(about = "Track receipts through extraction, email and payment with a full audit trail")]
#[command(long_about = "Receipt-ledger tracks each receipt file through the processing workflow \
                       (extraction, email submission, payment reconciliation), enforcing legal \
                       status transitions and recording every change in an append-only audit \
                       trail persisted as a single JSON log.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Register a receipt file and start tracking it
    Track {
        /// Path to the receipt image
        path: PathBuf,
    },
    /// Manually move one or more entries to a new status
    UpdateStatus {
        /// Entry ids to update
        #[arg(required = true)]
        ids: Vec<String>,
        /// Target status (e.g. processing, emailed)
        #[arg(long)]
        to: String,
        /// Free-text description of why this manual change happened
        #[arg(long)]
        action: Option<String>,
    },
    /// Queue a failed entry for another extraction attempt
    Retry {
        /// Entry id in error or no_data_extracted
        id: String,
    },
    /// Record that a receipt was emailed
    Email {
        /// Entry id in processed
        id: String,
        /// Address the receipt was sent to
        #[arg(long)]
        recipient: String,
        /// Send time (RFC 3339); defaults to now
        #[arg(long)]
        sent_at: Option<String>,
    },
    /// Record submission to a payment system
    Submit {
        /// Entry id in emailed
        id: String,
        /// Payment system tag (manual, quickbooks, xero, ...)
        #[arg(long, default_value = "manual")]
        system: String,
    },
    /// Record an incoming payment and reconcile the amount
    PaymentReceived {
        /// Entry id in submitted
        id: String,
        /// Amount received, e.g. 45.67
        #[arg(long)]
        amount: String,
        /// Payment system tag
        #[arg(long, default_value = "manual")]
        system: String,
        /// Receipt time (RFC 3339); defaults to now
        #[arg(long)]
        received_at: Option<String>,
    },
    /// List tracked receipts
    Logs {
        /// Only show entries in these statuses
        #[arg(long)]
        status: Vec<String>,
        /// Only show entries whose vendor contains this text
        #[arg(long)]
        vendor: Option<String>,
        /// Maximum entries to print, newest first
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Show the full audit trail for one entry
    Audit {
        /// Entry id
        id: String,
    },
    /// Aggregate processing report
    Report {
        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Retention pruning, log rotation and backup cleanup
    Cleanup,
}

/// Build the engine from configuration and dispatch one command.
pub async fn run(cli: Cli, config: ReceiptLedgerConfig) -> Result<()> {
    let storage = JsonStorageManager::new(config.storage.clone());
    let engine = ReceiptWorkflow::new(storage, config.workflow.clone());

    match cli.command {
        Commands::Track { path } => commands::track::run(&engine, path).await,
        Commands::UpdateStatus { ids, to, action } => {
            commands::update_status::run(&engine, ids, to, action).await
        }
        Commands::Retry { id } => commands::retry::run(&engine, id).await,
        Commands::Email {
            id,
            recipient,
            sent_at,
        } => commands::email::run(&engine, id, recipient, sent_at).await,
        Commands::Submit { id, system } => commands::submit::run(&engine, id, system).await,
        Commands::PaymentReceived {
            id,
            amount,
            system,
            received_at,
        } => commands::payment::run(&engine, id, amount, system, received_at).await,
        Commands::Logs {
            status,
            vendor,
            limit,
        } => commands::logs::run(&engine, status, vendor, limit).await,
        Commands::Audit { id } => commands::audit::run(&engine, id).await,
        Commands::Report { json } => commands::report::run(&engine, json).await,
        Commands::Cleanup => commands::cleanup::run(&engine).await,
    }
}
