//! Promotion handler behavior: every processed row is deleted and produces
//! exactly one log record, whatever the procedure does.

mod common;

use std::sync::Arc;

use common::{MockPromotionRepository, ProcedureBehavior};
use integra_shared::messaging::{LogSink, MemoryLogSink};
use integra_shared::models::PromotionRow;
use integra_shared::repositories::PromotionRepository;
use integra_worker::handlers::PromotionHandler;

fn pending_row(id: i64) -> PromotionRow {
    PromotionRow {
        id,
        payload: Some("{}".to_string()),
        received_at: Some("2025-01-01T00:00:00Z".to_string()),
    }
}

fn handler(
    repo: MockPromotionRepository,
) -> (Arc<MockPromotionRepository>, Arc<MemoryLogSink>, PromotionHandler) {
    let repo = Arc::new(repo);
    let sink = Arc::new(MemoryLogSink::new());
    let handler = PromotionHandler::new(
        Arc::clone(&repo) as Arc<dyn PromotionRepository>,
        Arc::clone(&sink) as Arc<dyn LogSink>,
    );
    (repo, sink, handler)
}

#[tokio::test]
async fn happy_path_deletes_row_and_publishes_success_record() {
    let (repo, sink, handler) = handler(MockPromotionRepository::new(
        vec![pending_row(7)],
        ProcedureBehavior::Succeed,
    ));

    handler.process(&serde_json::Map::new()).await;

    assert_eq!(repo.procedure_ids(), vec![7]);
    assert_eq!(repo.deleted_ids(), vec![7]);

    let records = sink.records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, 0);
    assert_eq!(records[0].table, "PROMOCAO");
    assert_eq!(records[0].transaction, "IN");
    assert_eq!(
        records[0].error_description,
        "Processamento realizado com sucesso."
    );
    assert_eq!(records[0].received_at, "2025-01-01T00:00:00Z");
}

#[tokio::test]
async fn business_failure_still_deletes_and_records_status_one() {
    let (repo, sink, handler) = handler(MockPromotionRepository::new(
        vec![pending_row(7)],
        ProcedureBehavior::BusinessFailure("ORA-20001: promotion rejected".to_string()),
    ));

    handler.process(&serde_json::Map::new()).await;

    assert_eq!(repo.deleted_ids(), vec![7]);

    let records = sink.records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, 1);
    assert_eq!(records[0].error_description, "ORA-20001: promotion rejected");
}

#[tokio::test]
async fn panic_is_neutralized_as_status_one_with_panic_prefix() {
    let (repo, sink, handler) = handler(MockPromotionRepository::new(
        vec![pending_row(7)],
        ProcedureBehavior::Panic("stored procedure exploded".to_string()),
    ));

    handler.process(&serde_json::Map::new()).await;

    // The row is gone and the record published even after the panic.
    assert_eq!(repo.deleted_ids(), vec![7]);

    let records = sink.records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, 1);
    assert!(
        records[0].error_description.starts_with("panic:"),
        "got: {}",
        records[0].error_description
    );
    assert!(records[0]
        .error_description
        .contains("stored procedure exploded"));
}

#[tokio::test]
async fn repository_error_is_recorded_as_failure() {
    let (repo, sink, handler) = handler(MockPromotionRepository::new(
        vec![pending_row(3)],
        ProcedureBehavior::Error("connection reset".to_string()),
    ));

    handler.process(&serde_json::Map::new()).await;

    assert_eq!(repo.deleted_ids(), vec![3]);
    let records = sink.records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, 1);
    assert!(records[0].error_description.contains("connection reset"));
}

#[tokio::test]
async fn delete_failure_does_not_suppress_the_outcome() {
    let (repo, sink, handler) = handler(
        MockPromotionRepository::new(vec![pending_row(7)], ProcedureBehavior::Succeed)
            .with_failing_delete(),
    );

    handler.process(&serde_json::Map::new()).await;

    assert_eq!(repo.deleted_ids(), vec![7]);
    let records = sink.records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, 0, "success outcome survives delete failure");
}

#[tokio::test]
async fn payload_promotion_is_processed_directly() {
    let (repo, sink, handler) = handler(MockPromotionRepository::new(
        Vec::new(),
        ProcedureBehavior::Succeed,
    ));

    let payload = serde_json::json!({
        "ipmd_id": 42,
        "json": "{\"descricao\":\"Promoção teste\"}",
        "datarecebimento": "2025-06-01 10:00:00",
    });
    let serde_json::Value::Object(payload) = payload else {
        unreachable!()
    };

    handler.process(&payload).await;

    assert_eq!(repo.procedure_ids(), vec![42]);
    assert_eq!(repo.deleted_ids(), vec![42]);

    let records = sink.records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].received_at, "2025-06-01 10:00:00");
}

#[tokio::test]
async fn every_pending_row_gets_exactly_one_record() {
    let (repo, sink, handler) = handler(MockPromotionRepository::new(
        vec![pending_row(1), pending_row(2), pending_row(3)],
        ProcedureBehavior::Succeed,
    ));

    handler.process(&serde_json::Map::new()).await;

    assert_eq!(repo.deleted_ids(), vec![1, 2, 3]);
    assert_eq!(sink.records().await.len(), 3);
}
