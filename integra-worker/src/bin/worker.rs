//! Worker entry point: wires the broker client, database pool,
//! repositories and handlers, then runs the listener until the process is
//! signalled.

use std::sync::Arc;

use tracing::{error, info};

use integra_shared::config::WorkerConfig;
use integra_shared::database;
use integra_shared::logging;
use integra_shared::messaging::{BrokerClient, LogSink, QueueLogSink};
use integra_shared::repositories::{
    PgIntegrationRepository, PgNetworkRepository, PgNormalizationRepository,
    PgParameterRepository, PgProductImportRepository, PgPromotionRepository,
};
use integra_worker::dispatcher::Dispatcher;
use integra_worker::handlers::{
    IntegrationJobPipeline, NormalizationHandler, ProductImportHandler, PromotionHandler,
};
use integra_worker::health;
use integra_worker::listener::Listener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_tracing();
    info!("starting integra worker");

    let config = WorkerConfig::from_env()?;
    info!(workers = config.workers, "configuration loaded");

    // Headroom beyond the worker count covers the pipeline transaction and
    // the health endpoint.
    let pool = database::connect_pool(&config.database_url, config.workers as u32 + 4).await?;
    info!("database pool established");

    let broker = Arc::new(BrokerClient::new(config.broker_url.clone()));
    let _monitor = broker.spawn_monitor();

    let log_sink: Arc<dyn LogSink> = Arc::new(QueueLogSink::new(Arc::clone(&broker)));

    let parameters = Arc::new(PgParameterRepository::new(pool.clone()));
    let integration = Arc::new(PgIntegrationRepository::new());
    let network = Arc::new(PgNetworkRepository::new());
    let promotions = Arc::new(PgPromotionRepository::new(pool.clone()));
    let products = Arc::new(PgProductImportRepository::new(pool.clone()));
    let normalizations = Arc::new(PgNormalizationRepository::new(pool.clone()));

    let pipeline = Arc::new(IntegrationJobPipeline::new(
        pool.clone(),
        parameters,
        integration,
        network,
    ));
    let promotion_handler = Arc::new(PromotionHandler::new(promotions, Arc::clone(&log_sink)));
    let product_handler = Arc::new(ProductImportHandler::new(products, Arc::clone(&log_sink)));
    let normalization_handler = Arc::new(NormalizationHandler::new(
        normalizations,
        Arc::clone(&log_sink),
    ));

    let dispatcher = Arc::new(
        Dispatcher::new()
            .with_promotion(promotion_handler)
            .with_product_import(product_handler)
            .with_normalization(normalization_handler)
            .with_integration_job(pipeline),
    );

    if let Some(addr) = config.health_addr.clone() {
        let broker = Arc::clone(&broker);
        tokio::spawn(async move {
            if let Err(err) = health::serve(addr, broker).await {
                error!(error = %err, "health endpoint terminated");
            }
        });
    }

    spawn_signal_handler();

    let listener = Listener::new(broker, dispatcher, config.workers);
    listener.run().await;
    Ok(())
}

/// SIGINT and SIGTERM exit immediately: in-flight deliveries stay unacked
/// and the broker redelivers them after restart.
fn spawn_signal_handler() {
    tokio::spawn(async {
        let signal = wait_for_signal().await;
        info!(signal, "shutdown signal received; exiting");
        std::process::exit(0);
    });
}

#[cfg(unix)]
async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate()).expect("install SIGTERM handler");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => "SIGINT",
        _ = sigterm.recv() => "SIGTERM",
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> &'static str {
    let _ = tokio::signal::ctrl_c().await;
    "SIGINT"
}
