//! Promotion staging rows and stored-procedure outcomes.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A pending row of `INTEGR_RMS_PROMOCAO_IN`. The same shape arrives inside
/// message payloads, so the serde names keep the producer's field names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PromotionRow {
    #[serde(rename = "ipmd_id")]
    pub id: i64,
    #[serde(rename = "json", default)]
    pub payload: Option<String>,
    #[serde(rename = "datarecebimento", default)]
    pub received_at: Option<String>,
}

/// Outcome of an integration stored procedure. Business failures are
/// encoded here; they never raise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcedureResult {
    pub success: bool,
    pub message: String,
}

impl ProcedureResult {
    pub fn success() -> Self {
        Self {
            success: true,
            message: crate::constants::SUCCESS_MESSAGE.to_string(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_promotion_deserializes_from_producer_names() {
        let row: PromotionRow = serde_json::from_str(
            r#"{"ipmd_id":7,"json":"{}","datarecebimento":"2025-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(row.id, 7);
        assert_eq!(row.payload.as_deref(), Some("{}"));
        assert_eq!(row.received_at.as_deref(), Some("2025-01-01T00:00:00Z"));
    }

    #[test]
    fn optional_fields_default_to_none() {
        let row: PromotionRow = serde_json::from_str(r#"{"ipmd_id":9}"#).unwrap();
        assert_eq!(row.id, 9);
        assert!(row.payload.is_none());
        assert!(row.received_at.is_none());
    }

    #[test]
    fn success_outcome_carries_the_standard_message() {
        let outcome = ProcedureResult::success();
        assert!(outcome.success);
        assert_eq!(outcome.message, "Processamento realizado com sucesso.");
    }
}
