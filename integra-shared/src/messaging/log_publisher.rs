//! Publisher for audit records on the `log` queue.
//!
//! Publishing is best-effort: the staging row has already been accounted
//! for by the time a record is emitted, so failures are logged and
//! swallowed rather than retried.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error};

use crate::constants::LOG_QUEUE;
use crate::messaging::broker::BrokerClient;
use crate::models::LogRecord;

/// Destination for [`LogRecord`]s. The worker wires the queue-backed
/// implementation; tests use [`MemoryLogSink`].
#[async_trait]
pub trait LogSink: Send + Sync {
    async fn publish(&self, record: &LogRecord);
}

/// Publishes records to the durable `log` queue.
pub struct QueueLogSink {
    broker: Arc<BrokerClient>,
}

impl QueueLogSink {
    pub fn new(broker: Arc<BrokerClient>) -> Self {
        Self { broker }
    }
}

#[async_trait]
impl LogSink for QueueLogSink {
    async fn publish(&self, record: &LogRecord) {
        let body = match serde_json::to_vec(&record.to_queue_message()) {
            Ok(body) => body,
            Err(err) => {
                error!(error = %err, "failed to serialize log record");
                return;
            }
        };

        match self.broker.publish(LOG_QUEUE, &body).await {
            Ok(()) => debug!(
                table = %record.table,
                status = record.status,
                "log record published"
            ),
            Err(err) => error!(
                error = %err,
                table = %record.table,
                "failed to publish log record"
            ),
        }
    }
}

/// In-memory sink that keeps every record for assertions.
#[derive(Default)]
pub struct MemoryLogSink {
    records: tokio::sync::Mutex<Vec<LogRecord>>,
}

impl MemoryLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn records(&self) -> Vec<LogRecord> {
        self.records.lock().await.clone()
    }
}

#[async_trait]
impl LogSink for MemoryLogSink {
    async fn publish(&self, record: &LogRecord) {
        self.records.lock().await.push(record.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_sink_records_everything_in_order() {
        let sink = MemoryLogSink::new();
        sink.publish(&LogRecord::ingestion("PROMOCAO", None, 0, "{}", "ok"))
            .await;
        sink.publish(&LogRecord::ingestion("PRODUTOS", None, 1, "{}", "bad"))
            .await;

        let records = sink.records().await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].table, "PROMOCAO");
        assert_eq!(records[0].status, 0);
        assert_eq!(records[1].table, "PRODUTOS");
        assert_eq!(records[1].status, 1);
    }
}
