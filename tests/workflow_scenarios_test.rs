// End-to-end workflow engine behavior over real storage in a temp dir.

use chrono::Utc;
use std::path::PathBuf;
use tempfile::TempDir;
use uuid::Uuid;

use receipt_ledger::{
    Currency, ExtractionOutcome, JsonStorageManager, PaymentUpdate, ProcessingStatus, ReceiptData,
    ReceiptWorkflow, StorageSettings, TransitionRejection, WorkflowError, WorkflowSettings,
};

fn engine_in(dir: &TempDir) -> ReceiptWorkflow {
    let storage = JsonStorageManager::new(StorageSettings {
        log_path: dir.path().join("receipt_log.json"),
        backup_dir: dir.path().join("backups"),
        ..StorageSettings::default()
    });
    ReceiptWorkflow::new(storage, WorkflowSettings::default())
}

fn extraction(confidence: f64) -> ReceiptData {
    ReceiptData {
        vendor_name: Some("Acme Office Supply".to_string()),
        transaction_date: Some(Utc::now()),
        total_amount: Some("45.67".parse().unwrap()),
        currency: Some(Currency::USD),
        receipt_number: Some("INV-1001".to_string()),
        tax_amount: None,
        subtotal: None,
        confidence_score: confidence,
    }
}

async fn tracked(engine: &ReceiptWorkflow) -> Uuid {
    engine
        .register_receipt(
            "receipt_001.jpg".to_string(),
            PathBuf::from("/receipts/receipt_001.jpg"),
            2048,
        )
        .await
        .unwrap()
        .id
}

async fn advance_to_submitted(engine: &ReceiptWorkflow, id: Uuid) {
    engine.begin_processing(id).await.unwrap();
    engine
        .complete_processing(id, ExtractionOutcome::extracted(extraction(0.95), Some(1.5)))
        .await
        .unwrap();
    engine
        .mark_emailed(id, "ap@example.com".to_string(), Utc::now())
        .await
        .unwrap();
    engine
        .mark_submitted(id, "quickbooks".to_string())
        .await
        .unwrap();
}

#[tokio::test]
async fn scenario_a_successful_extraction() {
    let dir = TempDir::new().unwrap();
    let engine = engine_in(&dir);
    let id = tracked(&engine).await;

    let entry = engine.begin_processing(id).await.unwrap();
    assert_eq!(entry.status, ProcessingStatus::Processing);

    let entry = engine
        .complete_processing(id, ExtractionOutcome::extracted(extraction(0.95), Some(2.1)))
        .await
        .unwrap();
    assert_eq!(entry.status, ProcessingStatus::Processed);
    let data = entry.receipt_data.expect("receipt data populated");
    assert_eq!(data.vendor_name.as_deref(), Some("Acme Office Supply"));
    assert_eq!(entry.processing_time, Some(2.1));
    assert!(entry.new_filename.is_some());

    let trail = engine.audit_trail(id).await.unwrap();
    assert_eq!(trail.len(), 2);
    assert_eq!(trail[1].from_status, ProcessingStatus::Processing);
    assert_eq!(trail[1].to_status, ProcessingStatus::Processed);
}

#[tokio::test]
async fn scenario_b_failure_then_retry() {
    let dir = TempDir::new().unwrap();
    let engine = engine_in(&dir);
    let id = tracked(&engine).await;

    engine.begin_processing(id).await.unwrap();
    let entry = engine
        .complete_processing(id, ExtractionOutcome::failed("timeout"))
        .await
        .unwrap();
    assert_eq!(entry.status, ProcessingStatus::Error);
    assert_eq!(entry.error_message.as_deref(), Some("timeout"));

    let entry = engine.retry(id, None).await.unwrap();
    assert_eq!(entry.status, ProcessingStatus::Processing);
    assert_eq!(entry.retry_count, 1);

    // The recovery went through the dedicated retry status.
    let trail = engine.audit_trail(id).await.unwrap();
    let statuses: Vec<ProcessingStatus> = trail.iter().map(|t| t.to_status).collect();
    assert_eq!(
        statuses,
        vec![
            ProcessingStatus::Processing,
            ProcessingStatus::Error,
            ProcessingStatus::Retry,
            ProcessingStatus::Processing,
        ]
    );
}

#[tokio::test]
async fn scenario_c_retry_ceiling() {
    let dir = TempDir::new().unwrap();
    let engine = engine_in(&dir);
    let id = tracked(&engine).await;

    engine.begin_processing(id).await.unwrap();
    for _ in 0..3 {
        engine
            .complete_processing(id, ExtractionOutcome::failed("connection refused"))
            .await
            .unwrap();
        engine.retry(id, None).await.unwrap();
    }
    engine
        .complete_processing(id, ExtractionOutcome::failed("connection refused"))
        .await
        .unwrap();

    let err = engine.retry(id, None).await.unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::RetryLimitExceeded { limit: 3, .. }
    ));

    // Entry stays put in its recoverable status, count unchanged.
    let entry = engine.entry(id).await.unwrap();
    assert_eq!(entry.status, ProcessingStatus::Error);
    assert_eq!(entry.retry_count, 3);
}

#[tokio::test]
async fn scenario_d_payment_reconciliation() {
    let dir = TempDir::new().unwrap();
    let engine = engine_in(&dir);

    // Matching amount: no mismatch flag.
    let id = tracked(&engine).await;
    advance_to_submitted(&engine, id).await;
    let reconciliation = engine
        .mark_payment_received(
            id,
            PaymentUpdate {
                amount: "45.67".parse().unwrap(),
                timestamp: Utc::now(),
                payment_system: "manual".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(
        reconciliation.entry.status,
        ProcessingStatus::PaymentReceived
    );
    assert!(reconciliation.mismatch.is_none());

    // Differing amount: transition still happens, mismatch flagged.
    let id = tracked(&engine).await;
    advance_to_submitted(&engine, id).await;
    let reconciliation = engine
        .mark_payment_received(
            id,
            PaymentUpdate {
                amount: "40.00".parse().unwrap(),
                timestamp: Utc::now(),
                payment_system: "manual".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(
        reconciliation.entry.status,
        ProcessingStatus::PaymentReceived
    );
    let mismatch = reconciliation.mismatch.expect("mismatch flagged");
    assert_eq!(mismatch.expected, "45.67".parse().unwrap());
    assert_eq!(mismatch.received, "40.00".parse().unwrap());
}

#[tokio::test]
async fn scenario_e_second_writer_sees_illegal_transition() {
    let dir = TempDir::new().unwrap();
    let first = engine_in(&dir);
    let second = engine_in(&dir);

    let id = tracked(&first).await;
    first.begin_processing(id).await.unwrap();
    first
        .complete_processing(id, ExtractionOutcome::extracted(extraction(0.95), None))
        .await
        .unwrap();

    // Both processes race to mark the same entry emailed; the second one
    // reloads under the lock and finds the entry already moved on.
    first
        .mark_emailed(id, "ap@example.com".to_string(), Utc::now())
        .await
        .unwrap();
    let err = second
        .mark_emailed(id, "ap@example.com".to_string(), Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::IllegalTransition(TransitionRejection::IllegalEdge {
            from: ProcessingStatus::Emailed,
            to: ProcessingStatus::Emailed,
        })
    ));

    let trail = second.audit_trail(id).await.unwrap();
    assert_eq!(
        trail
            .iter()
            .filter(|t| t.to_status == ProcessingStatus::Emailed)
            .count(),
        1
    );
}

#[tokio::test]
async fn rejected_transition_leaves_artifact_byte_identical() {
    let dir = TempDir::new().unwrap();
    let engine = engine_in(&dir);
    let id = tracked(&engine).await;

    let artifact = dir.path().join("receipt_log.json");
    let before = tokio::fs::read(&artifact).await.unwrap();

    // pending -> emailed is not a legal edge.
    let err = engine
        .mark_emailed(id, "ap@example.com".to_string(), Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::IllegalTransition(_)));

    let after = tokio::fs::read(&artifact).await.unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn repeating_an_applied_transition_is_rejected_without_new_records() {
    let dir = TempDir::new().unwrap();
    let engine = engine_in(&dir);
    let id = tracked(&engine).await;
    advance_to_submitted(&engine, id).await;

    let transitions_before = engine.audit_trail(id).await.unwrap().len();
    let err = engine
        .mark_submitted(id, "quickbooks".to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::IllegalTransition(_)));
    assert_eq!(engine.audit_trail(id).await.unwrap().len(), transitions_before);
}

#[tokio::test]
async fn status_always_matches_last_transition() {
    let dir = TempDir::new().unwrap();
    let engine = engine_in(&dir);
    let id = tracked(&engine).await;
    advance_to_submitted(&engine, id).await;

    let entry = engine.entry(id).await.unwrap();
    let trail = engine.audit_trail(id).await.unwrap();
    assert_eq!(entry.status, trail.last().unwrap().to_status);

    // Milestone fields exist exactly for the transitions that happened.
    assert!(entry.email_sent_at.is_some());
    assert!(entry.submitted_at.is_some());
    assert!(entry.payment_received_at.is_none());
    assert!(entry.updated_at >= entry.created_at);
}

#[tokio::test]
async fn low_confidence_extraction_lands_in_no_data_extracted() {
    let dir = TempDir::new().unwrap();
    let engine = engine_in(&dir);
    let id = tracked(&engine).await;

    engine.begin_processing(id).await.unwrap();
    let entry = engine
        .complete_processing(id, ExtractionOutcome::extracted(extraction(0.3), None))
        .await
        .unwrap();
    assert_eq!(entry.status, ProcessingStatus::NoDataExtracted);
    // Low-confidence data is not promoted into the entry.
    assert!(entry.receipt_data.is_none());
}

#[tokio::test]
async fn out_of_range_confidence_is_rejected_before_mutation() {
    let dir = TempDir::new().unwrap();
    let engine = engine_in(&dir);
    let id = tracked(&engine).await;
    engine.begin_processing(id).await.unwrap();

    let err = engine
        .complete_processing(id, ExtractionOutcome::extracted(extraction(1.7), None))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Validation { .. }));

    let entry = engine.entry(id).await.unwrap();
    assert_eq!(entry.status, ProcessingStatus::Processing);
}

#[tokio::test]
async fn non_positive_payment_amount_is_rejected() {
    let dir = TempDir::new().unwrap();
    let engine = engine_in(&dir);
    let id = tracked(&engine).await;
    advance_to_submitted(&engine, id).await;

    let err = engine
        .mark_payment_received(
            id,
            PaymentUpdate {
                amount: "0".parse().unwrap(),
                timestamp: Utc::now(),
                payment_system: "manual".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Validation { .. }));

    let entry = engine.entry(id).await.unwrap();
    assert_eq!(entry.status, ProcessingStatus::Submitted);
}

#[tokio::test]
async fn unknown_entry_is_reported() {
    let dir = TempDir::new().unwrap();
    let engine = engine_in(&dir);

    let err = engine.begin_processing(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, WorkflowError::UnknownEntry(_)));
}

#[tokio::test]
async fn bulk_update_reports_independent_outcomes() {
    let dir = TempDir::new().unwrap();
    let engine = engine_in(&dir);

    let pending_a = tracked(&engine).await;
    let pending_b = tracked(&engine).await;
    let submitted = tracked(&engine).await;
    advance_to_submitted(&engine, submitted).await;
    let missing = Uuid::new_v4();

    let report = engine
        .bulk_update(
            vec![pending_a, pending_b, submitted, missing],
            ProcessingStatus::Processing,
            Some("operator requeue".to_string()),
        )
        .await
        .unwrap();

    assert_eq!(report.applied, vec![pending_a, pending_b]);
    assert_eq!(report.rejected.len(), 2);
    assert!(report
        .rejected
        .iter()
        .any(|(id, err)| *id == submitted
            && matches!(err, WorkflowError::IllegalTransition(_))));
    assert!(report
        .rejected
        .iter()
        .any(|(id, err)| *id == missing && matches!(err, WorkflowError::UnknownEntry(_))));

    // Applied entries are persisted, rejected ones untouched.
    assert_eq!(
        engine.entry(pending_a).await.unwrap().status,
        ProcessingStatus::Processing
    );
    assert_eq!(
        engine.entry(submitted).await.unwrap().status,
        ProcessingStatus::Submitted
    );
}
