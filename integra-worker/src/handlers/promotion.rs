//! Promotion processing.
//!
//! A promotion message either carries one staging row in its payload or,
//! when the producer sends the bare kind, triggers a sweep of every pending
//! row. Each row goes through the stored procedure, is deleted from
//! staging whatever the outcome, and produces exactly one LogRecord.
//! Panics inside the procedure are neutralized as status-1 outcomes so a
//! poison row can never wedge a worker.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde_json::{Map, Value};
use tracing::{error, info, warn};

use integra_shared::errors::panic_message;
use integra_shared::messaging::LogSink;
use integra_shared::models::{LogRecord, ProcedureResult, PromotionRow};
use integra_shared::repositories::PromotionRepository;

pub struct PromotionHandler {
    repo: Arc<dyn PromotionRepository>,
    log_sink: Arc<dyn LogSink>,
}

impl PromotionHandler {
    pub fn new(repo: Arc<dyn PromotionRepository>, log_sink: Arc<dyn LogSink>) -> Self {
        Self { repo, log_sink }
    }

    /// Processes a promotion message. The outcome is always recorded on the
    /// log queue; this method never fails the message.
    pub async fn process(&self, payload: &Map<String, Value>) {
        if payload.is_empty() {
            self.process_pending().await;
            return;
        }

        match serde_json::from_value::<PromotionRow>(Value::Object(payload.clone())) {
            Ok(row) => self.process_row(&row).await,
            Err(err) => {
                error!(error = %err, "promotion payload is malformed; falling back to pending sweep");
                self.process_pending().await;
            }
        }
    }

    async fn process_pending(&self) {
        match self.repo.list_pending().await {
            Ok(rows) => {
                info!(count = rows.len(), "processing pending promotions");
                for row in &rows {
                    self.process_row(row).await;
                }
            }
            Err(err) => error!(error = %err, "failed to list pending promotions"),
        }
    }

    async fn process_row(&self, row: &PromotionRow) {
        let outcome = AssertUnwindSafe(self.repo.run_procedure(row.id))
            .catch_unwind()
            .await;

        let result = match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(err)) => {
                error!(id = row.id, error = %err, "promotion procedure failed");
                ProcedureResult::failure(err.to_string())
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(id = row.id, panic = %message, "promotion procedure panicked");
                ProcedureResult::failure(format!("panic: {message}"))
            }
        };

        // The row goes away either way; a failed delete is logged but does
        // not change the recorded outcome.
        if let Err(err) = self.repo.delete(row.id).await {
            warn!(id = row.id, error = %err, "failed to delete processed promotion");
        }

        let payload_json =
            serde_json::to_string(row).unwrap_or_else(|_| "{}".to_string());
        let status = if result.success { 0 } else { 1 };
        let record = LogRecord::ingestion(
            "PROMOCAO",
            row.received_at.as_deref(),
            status,
            payload_json,
            result.message.clone(),
        );
        self.log_sink.publish(&record).await;

        if result.success {
            info!(id = row.id, "promotion processed");
        } else {
            warn!(id = row.id, message = %result.message, "promotion processing failed");
        }
    }
}
