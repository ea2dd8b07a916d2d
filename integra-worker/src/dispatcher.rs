//! Routes decoded messages to their integration handlers.
//!
//! Pure routing: each kind checks its handler is wired before invoking it.
//! A missing handler is a configuration problem no retry can fix, so it is
//! reported as an error and the message is still acknowledged upstream.

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info};

use integra_shared::errors::{IntegraError, IntegraResult};
use integra_shared::messaging::{decode, MessageKind};

use crate::handlers::{
    IntegrationJobPipeline, NormalizationHandler, ProductImportHandler, PromotionHandler,
};

#[derive(Default)]
pub struct Dispatcher {
    promotion: Option<Arc<PromotionHandler>>,
    product_import: Option<Arc<ProductImportHandler>>,
    normalization: Option<Arc<NormalizationHandler>>,
    integration_job: Option<Arc<IntegrationJobPipeline>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_promotion(mut self, handler: Arc<PromotionHandler>) -> Self {
        self.promotion = Some(handler);
        self
    }

    pub fn with_product_import(mut self, handler: Arc<ProductImportHandler>) -> Self {
        self.product_import = Some(handler);
        self
    }

    pub fn with_normalization(mut self, handler: Arc<NormalizationHandler>) -> Self {
        self.normalization = Some(handler);
        self
    }

    pub fn with_integration_job(mut self, pipeline: Arc<IntegrationJobPipeline>) -> Self {
        self.integration_job = Some(pipeline);
        self
    }

    /// Decodes and handles one delivery body. Errors returned here are
    /// terminal for the message: the worker logs them and acknowledges.
    pub async fn dispatch(&self, body: &[u8]) -> IntegraResult<()> {
        let envelope = decode(body).map_err(|err| {
            error!(error = %err, "failed to decode message envelope");
            IntegraError::Decode(err.to_string())
        })?;

        info!(kind = envelope.kind.label(), "message received");

        match envelope.kind {
            MessageKind::Promotion => {
                let handler = self
                    .promotion
                    .as_ref()
                    .ok_or_else(|| missing("promotion handler"))?;
                let pipeline = self
                    .integration_job
                    .as_ref()
                    .ok_or_else(|| missing("integration-job pipeline"))?;

                // The promotion outcome is logged by the handler whatever
                // happens; the housekeeping tail decides this message's
                // error.
                handler.process(&envelope.payload).await;
                pipeline.run(Utc::now()).await
            }
            MessageKind::ProductImport => {
                let handler = self
                    .product_import
                    .as_ref()
                    .ok_or_else(|| missing("product-import handler"))?;
                let all_succeeded = handler.import_all().await?;
                if !all_succeeded {
                    info!("product import completed with per-row failures");
                }
                Ok(())
            }
            MessageKind::PromotionNormalization => {
                let handler = self
                    .normalization
                    .as_ref()
                    .ok_or_else(|| missing("normalization handler"))?;
                let summary = handler.normalize_all().await?;
                info!(
                    processed = summary.processed,
                    updated = summary.updated,
                    duplicates = summary.duplicates_removed,
                    success = summary.success,
                    "normalization summary"
                );
                Ok(())
            }
            MessageKind::MoveHousekeeping => {
                let pipeline = self
                    .integration_job
                    .as_ref()
                    .ok_or_else(|| missing("integration-job pipeline"))?;
                pipeline.run(Utc::now()).await
            }
            MessageKind::Unknown(kind) => {
                error!(kind = %kind, "unknown integration kind");
                Err(IntegraError::UnknownKind(kind))
            }
        }
    }
}

fn missing(name: &str) -> IntegraError {
    error!(dependency = name, "handler dependency is not configured");
    IntegraError::missing_dependency(name)
}
