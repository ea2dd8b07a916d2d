//! Promotion normalization sweep.
//!
//! Walks every staging row, removes duplicate grouped items and rewrites
//! the JSON of the rows it changed. The whole pass runs in one repository
//! sweep (a single transaction); per-row parse and update failures are
//! recorded and skipped, a sweep-level panic rolls everything back and
//! surfaces as a failed summary.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::Utc;
use futures::FutureExt;
use tracing::{error, info, warn};

use integra_shared::errors::{panic_message, IntegraResult};
use integra_shared::messaging::LogSink;
use integra_shared::models::{
    LogRecord, NormalizationLog, NormalizationRow, NormalizationSummary, PromotionJson,
};
use integra_shared::repositories::{NormalizationRepository, NormalizationSweep};

const STAGING_TABLE: &str = "INTEGRACAOPROMOCAOSTAGING";
const PROGRESS_EVERY: usize = 100;

pub struct NormalizationHandler {
    repo: Arc<dyn NormalizationRepository>,
    log_sink: Arc<dyn LogSink>,
}

impl NormalizationHandler {
    pub fn new(repo: Arc<dyn NormalizationRepository>, log_sink: Arc<dyn LogSink>) -> Self {
        Self { repo, log_sink }
    }

    pub async fn normalize_all(&self) -> IntegraResult<NormalizationSummary> {
        info!("promotion normalization started");

        let mut sweep = self.repo.begin().await?;
        let outcome = AssertUnwindSafe(self.sweep_rows(sweep.as_mut()))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(summary)) => {
                sweep.commit().await?;
                info!(
                    processed = summary.processed,
                    updated = summary.updated,
                    duplicates = summary.duplicates_removed,
                    "promotion normalization finished"
                );
                Ok(summary)
            }
            Ok(Err(err)) => {
                // Dropping the sweep rolls the transaction back.
                drop(sweep);
                error!(error = %err, "promotion normalization failed");
                let record = LogRecord::update(STAGING_TABLE, 1, "{}", err.to_string());
                self.log_sink.publish(&record).await;
                Err(err)
            }
            Err(panic) => {
                drop(sweep);
                let message = format!("panic: {}", panic_message(panic.as_ref()));
                error!(%message, "promotion normalization panicked");
                let record = LogRecord::update(
                    STAGING_TABLE,
                    1,
                    "{}",
                    format!("Panic during normalization: {message}"),
                );
                self.log_sink.publish(&record).await;
                Ok(NormalizationSummary {
                    success: false,
                    message,
                    processed: 0,
                    updated: 0,
                    duplicates_removed: 0,
                })
            }
        }
    }

    async fn sweep_rows(
        &self,
        sweep: &mut dyn NormalizationSweep,
    ) -> IntegraResult<NormalizationSummary> {
        let rows = sweep.list_all().await?;
        info!(total = rows.len(), "normalization sweep");

        let mut processed = 0_usize;
        let mut updated = 0_usize;
        let mut duplicates_removed = 0_usize;

        for row in &rows {
            processed += 1;

            if let Some(row_duplicates) = self.normalize_row(sweep, row).await {
                updated += 1;
                duplicates_removed += row_duplicates;
            }

            if processed % PROGRESS_EVERY == 0 {
                info!(processed, updated, "normalization progress");
            }
        }

        let message = format!(
            "Processamento concluído. Total processados: {processed}, Total atualizados: {updated}"
        );
        Ok(NormalizationSummary {
            success: true,
            message,
            processed,
            updated,
            duplicates_removed,
        })
    }

    /// Normalizes one row. Returns the number of duplicates removed when
    /// the row was rewritten, `None` when it was left alone or skipped.
    async fn normalize_row(
        &self,
        sweep: &mut dyn NormalizationSweep,
        row: &NormalizationRow,
    ) -> Option<usize> {
        let mut data: PromotionJson = match serde_json::from_str(&row.payload) {
            Ok(data) => data,
            Err(err) => {
                warn!(id = row.id, error = %err, "invalid promotion JSON; row skipped");
                return None;
            }
        };

        let outcome = data.dedupe_items();
        if !outcome.changed {
            return None;
        }

        let payload = match serde_json::to_string(&data) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(id = row.id, error = %err, "failed to serialize normalized JSON");
                return None;
            }
        };

        if let Err(err) = sweep.update(row, &payload, Utc::now()).await {
            warn!(id = row.id, error = %err, "failed to update normalized row");
            return None;
        }

        let detail = NormalizationLog {
            id: row.id,
            promotion_id: row.promotion_id.unwrap_or(0),
            dealer_id: row.dealer_id.unwrap_or(0),
            mix_code: data.mix_code.clone(),
            duplicates_removed: outcome.duplicates_removed,
        };
        let payload_json =
            serde_json::to_string(&detail).unwrap_or_else(|_| "{}".to_string());
        let record = LogRecord::update(
            STAGING_TABLE,
            0,
            payload_json,
            format!(
                "Itens duplicados removidos dos grupos. Total removidos: {}",
                outcome.duplicates_removed
            ),
        );
        self.log_sink.publish(&record).await;

        Some(outcome.duplicates_removed)
    }
}
