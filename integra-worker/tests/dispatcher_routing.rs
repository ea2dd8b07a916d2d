//! Dispatcher policies: unknown kinds, malformed bodies, missing
//! dependencies, and the promotion → housekeeping tail ordering.

mod common;

use std::sync::Arc;

use common::{
    lazy_pool, MockParameterRepository, MockPromotionRepository, ProcedureBehavior,
    UnreachableIntegrationRepository, UnreachableNetworkRepository,
};
use integra_shared::errors::IntegraError;
use integra_shared::messaging::{LogSink, MemoryLogSink};
use integra_shared::models::PromotionRow;
use integra_shared::repositories::PromotionRepository;
use integra_worker::handlers::{IntegrationJobPipeline, PromotionHandler};
use integra_worker::Dispatcher;

/// A pipeline over the given parameters; the tests keep it on code paths
/// that fail or no-op before the first database write.
fn pipeline_with(parameters: MockParameterRepository) -> Arc<IntegrationJobPipeline> {
    Arc::new(IntegrationJobPipeline::new(
        lazy_pool(),
        Arc::new(parameters),
        Arc::new(UnreachableIntegrationRepository),
        Arc::new(UnreachableNetworkRepository),
    ))
}

#[tokio::test]
async fn unknown_kind_is_a_terminal_error() {
    let dispatcher = Dispatcher::new();
    let err = dispatcher
        .dispatch(br#"{"type_message":"foo"}"#)
        .await
        .unwrap_err();

    match err {
        IntegraError::UnknownKind(kind) => assert_eq!(kind, "foo"),
        other => panic!("expected UnknownKind, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let dispatcher = Dispatcher::new();
    let err = dispatcher.dispatch(br#"{"dados":{}}"#).await.unwrap_err();
    assert!(matches!(err, IntegraError::Decode(_)));

    let err = dispatcher.dispatch(b"[1,2,3]").await.unwrap_err();
    assert!(matches!(err, IntegraError::Decode(_)));
}

#[tokio::test]
async fn missing_handler_is_a_missing_dependency_error() {
    let dispatcher = Dispatcher::new();

    for body in [
        &b"promocao"[..],
        &b"produto"[..],
        &b"promocao_normalizacao"[..],
        &b"mover"[..],
    ] {
        let err = dispatcher.dispatch(body).await.unwrap_err();
        assert!(
            matches!(err, IntegraError::MissingDependency(_)),
            "body {:?} gave {err:?}",
            std::str::from_utf8(body)
        );
    }
}

#[tokio::test]
async fn promotion_logs_outcome_and_runs_the_housekeeping_tail() {
    let repo = Arc::new(MockPromotionRepository::new(
        vec![PromotionRow {
            id: 7,
            payload: Some("{}".to_string()),
            received_at: None,
        }],
        ProcedureBehavior::Succeed,
    ));
    let sink = Arc::new(MemoryLogSink::new());
    let handler = Arc::new(PromotionHandler::new(
        Arc::clone(&repo) as Arc<dyn PromotionRepository>,
        Arc::clone(&sink) as Arc<dyn LogSink>,
    ));

    let parameters = MockParameterRepository::empty();
    let dispatcher = Dispatcher::new()
        .with_promotion(handler)
        .with_integration_job(pipeline_with(parameters));

    dispatcher.dispatch(b"promocao").await.unwrap();

    assert_eq!(repo.deleted_ids(), vec![7]);
    assert_eq!(sink.records().await.len(), 1);
}

#[tokio::test]
async fn pipeline_error_is_returned_but_promotion_outcome_is_still_logged() {
    let repo = Arc::new(MockPromotionRepository::new(
        vec![PromotionRow {
            id: 9,
            payload: None,
            received_at: None,
        }],
        ProcedureBehavior::Succeed,
    ));
    let sink = Arc::new(MemoryLogSink::new());
    let handler = Arc::new(PromotionHandler::new(
        Arc::clone(&repo) as Arc<dyn PromotionRepository>,
        Arc::clone(&sink) as Arc<dyn LogSink>,
    ));

    // A non-numeric removal parameter makes the pipeline fail fast.
    let parameters =
        MockParameterRepository::empty().with("REMOVER_TRANSACAO_MINUTOS", "soon", "*");
    let dispatcher = Dispatcher::new()
        .with_promotion(handler)
        .with_integration_job(pipeline_with(parameters));

    let err = dispatcher.dispatch(b"promocao").await.unwrap_err();
    assert!(matches!(err, IntegraError::NonNumericParameter { .. }));

    // The promotion itself was processed and recorded before the tail ran.
    assert_eq!(repo.deleted_ids(), vec![9]);
    assert_eq!(sink.records().await.len(), 1);
}

#[tokio::test]
async fn move_kind_runs_the_pipeline() {
    let parameters = MockParameterRepository::empty();
    let dispatcher = Dispatcher::new().with_integration_job(pipeline_with(parameters));

    // Disabled pipeline: the message succeeds without touching anything.
    dispatcher.dispatch(b"mover").await.unwrap();
    dispatcher.dispatch(br#""productNetworkMain""#).await.unwrap();
}

#[tokio::test]
async fn quoted_raw_text_routes_like_the_bare_kind() {
    let repo = Arc::new(MockPromotionRepository::new(
        Vec::new(),
        ProcedureBehavior::Succeed,
    ));
    let sink = Arc::new(MemoryLogSink::new());
    let handler = Arc::new(PromotionHandler::new(
        Arc::clone(&repo) as Arc<dyn PromotionRepository>,
        Arc::clone(&sink) as Arc<dyn LogSink>,
    ));

    let dispatcher = Dispatcher::new()
        .with_promotion(handler)
        .with_integration_job(pipeline_with(MockParameterRepository::empty()));

    dispatcher.dispatch(b"'promocao'").await.unwrap();
}
