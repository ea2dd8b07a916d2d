//! Parameter gating of the integration-job pipeline: a missing removal
//! parameter disables the whole run before any database write, and
//! non-numeric tunables are fatal.

mod common;

use std::sync::Arc;

use common::{
    lazy_pool, MockParameterRepository, UnreachableIntegrationRepository,
    UnreachableNetworkRepository,
};
use chrono::Utc;
use integra_shared::errors::IntegraError;
use integra_shared::repositories::ParameterRepository;
use integra_worker::handlers::IntegrationJobPipeline;

fn pipeline(parameters: MockParameterRepository) -> (Arc<MockParameterRepository>, IntegrationJobPipeline) {
    let parameters = Arc::new(parameters);
    let pipeline = IntegrationJobPipeline::new(
        lazy_pool(),
        Arc::clone(&parameters) as Arc<dyn ParameterRepository>,
        Arc::new(UnreachableIntegrationRepository),
        Arc::new(UnreachableNetworkRepository),
    );
    (parameters, pipeline)
}

#[tokio::test]
async fn missing_removal_parameter_disables_the_pipeline() {
    let (parameters, pipeline) = pipeline(MockParameterRepository::empty());

    pipeline.run(Utc::now()).await.unwrap();

    // Only the gate parameter was read; nothing was written. The
    // unreachable repositories guarantee no cleanup ran.
    assert_eq!(parameters.lookup_codes(), vec!["REMOVER_TRANSACAO_MINUTOS"]);
    assert_eq!(parameters.update_count(), 0);
}

#[tokio::test]
async fn non_numeric_removal_parameter_is_fatal() {
    let (_, pipeline) = pipeline(
        MockParameterRepository::empty().with("REMOVER_TRANSACAO_MINUTOS", "abc", "*"),
    );

    let err = pipeline.run(Utc::now()).await.unwrap_err();
    match err {
        IntegraError::NonNumericParameter { code, value } => {
            assert_eq!(code, "REMOVER_TRANSACAO_MINUTOS");
            assert_eq!(value, "abc");
        }
        other => panic!("expected NonNumericParameter, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_purge_parameter_is_fatal() {
    let (parameters, pipeline) = pipeline(
        MockParameterRepository::empty().with("REMOVER_TRANSACAO_MINUTOS", "0", "*"),
    );

    let err = pipeline.run(Utc::now()).await.unwrap_err();
    assert!(matches!(err, IntegraError::Configuration(_)));
    assert_eq!(
        parameters.lookup_codes(),
        vec!["REMOVER_TRANSACAO_MINUTOS", "EXPURGO_INTEGRACAO_DIAS"]
    );
    assert_eq!(parameters.update_count(), 0);
}

#[tokio::test]
async fn non_numeric_purge_parameter_is_fatal() {
    let (_, pipeline) = pipeline(
        MockParameterRepository::empty()
            .with("REMOVER_TRANSACAO_MINUTOS", "30", "*")
            .with("EXPURGO_INTEGRACAO_DIAS", "two weeks", "*"),
    );

    let err = pipeline.run(Utc::now()).await.unwrap_err();
    assert!(matches!(
        err,
        IntegraError::NonNumericParameter { .. }
    ));
}
