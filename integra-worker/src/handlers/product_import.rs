//! Product import sweep.
//!
//! Reads a snapshot of the pending staging rows, then works through them
//! inside one repository sweep (a single transaction). Row failures never
//! abort the sweep: the outcome is recorded on the log queue (outside the
//! transaction) and the row is deleted regardless so a poison payload
//! cannot loop forever.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{error, info, warn};

use integra_shared::errors::{panic_message, IntegraResult};
use integra_shared::messaging::LogSink;
use integra_shared::models::{LogRecord, ProcedureResult, ProductRow};
use integra_shared::repositories::{ProductImportRepository, ProductImportSweep};

pub struct ProductImportHandler {
    repo: Arc<dyn ProductImportRepository>,
    log_sink: Arc<dyn LogSink>,
}

impl ProductImportHandler {
    pub fn new(repo: Arc<dyn ProductImportRepository>, log_sink: Arc<dyn LogSink>) -> Self {
        Self { repo, log_sink }
    }

    /// Imports every pending product row. Returns `true` iff all rows
    /// succeeded; individual failures are recorded, not raised.
    pub async fn import_all(&self) -> IntegraResult<bool> {
        info!("product import started");

        let rows = self.repo.list_pending().await?;
        let mut sweep = self.repo.begin().await?;

        let mut all_succeeded = true;
        for row in &rows {
            let result = self.process_row(sweep.as_mut(), row).await;

            let payload_json =
                serde_json::to_string(row).unwrap_or_else(|_| "{}".to_string());
            let status = if result.success { 0 } else { 1 };
            let message = if result.success {
                "Integração de Produtos Realizada com Sucesso".to_string()
            } else {
                result.message.clone()
            };
            let record = LogRecord::ingestion(
                "PRODUTOS",
                row.received_at.as_deref(),
                status,
                payload_json,
                message,
            );
            self.log_sink.publish(&record).await;

            if !result.success {
                all_succeeded = false;
            }

            if let Some(id) = row.id {
                if let Err(err) = sweep.delete(id).await {
                    error!(id, error = %err, "failed to delete processed product row");
                    all_succeeded = false;
                }
            }
        }

        sweep.commit().await?;

        info!(
            rows = rows.len(),
            all_succeeded, "product import finished"
        );
        Ok(all_succeeded)
    }

    async fn process_row(
        &self,
        sweep: &mut dyn ProductImportSweep,
        row: &ProductRow,
    ) -> ProcedureResult {
        let outcome = AssertUnwindSafe(self.run_row(sweep, row)).catch_unwind().await;
        match outcome {
            Ok(result) => result,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(id = ?row.id, panic = %message, "product row processing panicked");
                ProcedureResult::failure(format!("panic: {message}"))
            }
        }
    }

    async fn run_row(
        &self,
        sweep: &mut dyn ProductImportSweep,
        row: &ProductRow,
    ) -> ProcedureResult {
        if let Err(err) = row.parse_payload() {
            return ProcedureResult::failure(format!("Error parsing JSON: {err}"));
        }

        let Some(id) = row.id else {
            return ProcedureResult::failure("Invalid IPR_ID");
        };

        match sweep.run_procedure(id).await {
            Ok(result) => result,
            Err(err) => {
                warn!(id, error = %err, "product procedure errored");
                ProcedureResult::failure(err.to_string())
            }
        }
    }
}
