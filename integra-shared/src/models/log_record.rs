//! Audit records published to the `log` queue.
//!
//! Downstream consumers expect the `LogIntegrRMS` envelope: a table name
//! plus positionally aligned `fields`/`values` arrays with a fixed field
//! order. Records are published, never stored locally.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// Fixed field order of the `LogIntegrRMS` envelope.
pub const LOG_FIELDS: [&str; 7] = [
    "TRANSACAO",
    "TABELA",
    "DATARECEBIMENTO",
    "DATAPROCESSAMENTO",
    "STATUSPROCESSAMENTO",
    "JSON",
    "DESCRICAOERRO",
];

/// One audit entry: the outcome of processing a single staging row.
/// `status` is 0 for success and 1 for business failure or panic.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub transaction: String,
    pub table: String,
    pub received_at: String,
    pub processed_at: String,
    pub status: i32,
    pub payload_json: String,
    pub error_description: String,
}

impl LogRecord {
    /// An ingestion record (`TRANSACAO = "IN"`), used by the promotion and
    /// product handlers.
    pub fn ingestion(
        table: impl Into<String>,
        received_at: Option<&str>,
        status: i32,
        payload_json: impl Into<String>,
        error_description: impl Into<String>,
    ) -> Self {
        let now = format_timestamp(Utc::now());
        Self {
            transaction: "IN".to_string(),
            table: table.into(),
            received_at: received_at
                .filter(|value| !value.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| now.clone()),
            processed_at: now,
            status,
            payload_json: payload_json.into(),
            error_description: error_description.into(),
        }
    }

    /// An update record (`TRANSACAO = "UPDATE"`), used by the
    /// normalization sweep.
    pub fn update(
        table: impl Into<String>,
        status: i32,
        payload_json: impl Into<String>,
        error_description: impl Into<String>,
    ) -> Self {
        let now = format_timestamp(Utc::now());
        Self {
            transaction: "UPDATE".to_string(),
            table: table.into(),
            received_at: now.clone(),
            processed_at: now,
            status,
            payload_json: payload_json.into(),
            error_description: error_description.into(),
        }
    }

    /// Renders the wire envelope for the `log` queue.
    pub fn to_queue_message(&self) -> QueueMessage {
        QueueMessage {
            table: "LogIntegrRMS".to_string(),
            fields: LOG_FIELDS.iter().map(|f| f.to_string()).collect(),
            values: vec![
                Value::from(self.transaction.clone()),
                Value::from(self.table.clone()),
                Value::from(self.received_at.clone()),
                Value::from(self.processed_at.clone()),
                Value::from(self.status),
                Value::from(self.payload_json.clone()),
                Value::from(self.error_description.clone()),
            ],
        }
    }
}

/// The `LogIntegrRMS` wire envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueMessage {
    #[serde(rename = "tabela")]
    pub table: String,
    pub fields: Vec<String>,
    pub values: Vec<Value>,
}

/// Timestamps on the log queue use the legacy `YYYY-MM-DD HH:MM:SS` form.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_keeps_the_fixed_field_order() {
        let record = LogRecord::ingestion("PROMOCAO", Some("2025-01-01 00:00:00"), 0, "{}", "ok");
        let message = record.to_queue_message();

        assert_eq!(message.table, "LogIntegrRMS");
        assert_eq!(
            message.fields,
            vec![
                "TRANSACAO",
                "TABELA",
                "DATARECEBIMENTO",
                "DATAPROCESSAMENTO",
                "STATUSPROCESSAMENTO",
                "JSON",
                "DESCRICAOERRO",
            ]
        );
        assert_eq!(message.values.len(), message.fields.len());
        assert_eq!(message.values[0], Value::from("IN"));
        assert_eq!(message.values[1], Value::from("PROMOCAO"));
        assert_eq!(message.values[2], Value::from("2025-01-01 00:00:00"));
        assert_eq!(message.values[4], Value::from(0));
        assert_eq!(message.values[6], Value::from("ok"));
    }

    #[test]
    fn serialized_envelope_uses_legacy_key_names() {
        let record = LogRecord::update("INTEGRACAOPROMOCAOSTAGING", 0, "{}", "done");
        let json = serde_json::to_string(&record.to_queue_message()).unwrap();
        assert!(json.starts_with(r#"{"tabela":"LogIntegrRMS""#));
        assert!(json.contains(r#""fields":["#));
        assert!(json.contains(r#""values":["#));
        assert!(json.contains("UPDATE"));
    }

    #[test]
    fn missing_received_at_falls_back_to_processing_time() {
        let record = LogRecord::ingestion("PRODUTOS", None, 1, "{}", "bad row");
        assert!(!record.received_at.is_empty());
        assert_eq!(record.received_at, record.processed_at);

        let record = LogRecord::ingestion("PRODUTOS", Some(""), 1, "{}", "bad row");
        assert_eq!(record.received_at, record.processed_at);
    }

    #[test]
    fn timestamp_format_is_second_precision() {
        let at = DateTime::parse_from_rfc3339("2025-03-04T05:06:07.123Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(format_timestamp(at), "2025-03-04 05:06:07");
    }
}
