//! Product staging rows and the JSON payload they carry.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A pending row of `INTEGR_RMS_PRODUTO_IN`. Rows are deleted after
/// processing whether they succeed or not, so a poison payload cannot loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ProductRow {
    #[serde(rename = "ipr_id")]
    pub id: Option<i64>,
    #[serde(rename = "json", default)]
    pub payload: Option<String>,
    #[serde(rename = "datarecebimento", default)]
    pub received_at: Option<String>,
}

/// Parsed form of a product staging payload. Only the envelope is
/// validated here; the stored procedure owns the row's business rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPayload {
    #[serde(rename = "produtosSelect", default)]
    pub products: Vec<ProductSelection>,
    #[serde(default)]
    pub pesavel: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSelection {
    #[serde(default)]
    pub desc: String,
    #[serde(rename = "codRms", default)]
    pub rms_code: String,
    #[serde(default)]
    pub status: String,
}

impl ProductRow {
    /// Parses the staged JSON payload; an absent or malformed payload is a
    /// per-row business failure, not an error.
    pub fn parse_payload(&self) -> Result<ProductPayload, serde_json::Error> {
        let raw = self.payload.as_deref().unwrap_or("");
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_producer_payload() {
        let row = ProductRow {
            id: Some(1),
            payload: Some(
                r#"{"produtosSelect":[{"desc":"Refrigerante","codRms":"123","status":"A"}],"pesavel":"N"}"#
                    .to_string(),
            ),
            received_at: None,
        };
        let payload = row.parse_payload().unwrap();
        assert_eq!(payload.products.len(), 1);
        assert_eq!(payload.products[0].rms_code, "123");
        assert_eq!(payload.pesavel, "N");
    }

    #[test]
    fn malformed_payload_is_an_error() {
        let row = ProductRow {
            id: Some(2),
            payload: Some("{not json".to_string()),
            received_at: None,
        };
        assert!(row.parse_payload().is_err());
    }

    #[test]
    fn missing_payload_is_an_error() {
        let row = ProductRow {
            id: Some(3),
            payload: None,
            received_at: None,
        };
        assert!(row.parse_payload().is_err());
    }
}
