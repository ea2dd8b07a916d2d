//! Promotion-normalization rows and the grouped-item JSON they carry.
//!
//! The normalization sweep enforces one invariant per group: `codBarra`
//! values are unique and non-empty, and `qtdeItem` equals the item count.
//! The deduplication itself is a pure function on [`PromotionJson`] so the
//! idempotence law is directly testable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row of the `INTEGRACAO_PROMOCAO` staging table.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct NormalizationRow {
    pub id: i64,
    pub dealer_id: Option<i64>,
    pub promotion_id: Option<i64>,
    pub payload: String,
    pub updated_at: Option<DateTime<Utc>>,
    pub received_at: Option<DateTime<Utc>>,
    pub sending: Option<String>,
    pub transaction: Option<String>,
    pub send_started_at: Option<DateTime<Utc>>,
}

/// Structure of the JSON column. Field order is the canonical serialization
/// order, so re-serializing an unchanged value is byte-stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromotionJson {
    #[serde(rename = "codMix", default)]
    pub mix_code: String,
    #[serde(rename = "grupos", default)]
    pub groups: Vec<PromotionGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromotionGroup {
    #[serde(default)]
    pub desc: String,
    #[serde(rename = "qtdeItem", default)]
    pub item_count: i64,
    #[serde(default)]
    pub items: Vec<PromotionItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromotionItem {
    #[serde(rename = "codBarra", default)]
    pub barcode: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub preco: f64,
    #[serde(default)]
    pub qtde: i64,
}

/// What a deduplication pass did to one payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DedupeOutcome {
    pub changed: bool,
    pub duplicates_removed: usize,
}

impl PromotionJson {
    /// Removes duplicate and empty-barcode items from every group, keeping
    /// the first occurrence of each barcode, and fixes `qtdeItem` on the
    /// groups it touched.
    pub fn dedupe_items(&mut self) -> DedupeOutcome {
        let mut outcome = DedupeOutcome::default();

        for group in &mut self.groups {
            if group.items.is_empty() {
                continue;
            }

            let mut seen = std::collections::HashSet::new();
            let original_len = group.items.len();
            group
                .items
                .retain(|item| !item.barcode.is_empty() && seen.insert(item.barcode.clone()));

            if group.items.len() != original_len {
                group.item_count = group.items.len() as i64;
                outcome.changed = true;
                outcome.duplicates_removed += original_len - group.items.len();
            }
        }

        outcome
    }
}

/// Result of a full normalization sweep.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizationSummary {
    pub success: bool,
    pub message: String,
    pub processed: usize,
    pub updated: usize,
    pub duplicates_removed: usize,
}

/// Per-row detail published with each rewrite.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizationLog {
    #[serde(rename = "id_integracao_promocao")]
    pub id: i64,
    #[serde(rename = "id_promocao")]
    pub promotion_id: i64,
    #[serde(rename = "id_revendedor")]
    pub dealer_id: i64,
    #[serde(rename = "cod_mix")]
    pub mix_code: String,
    #[serde(rename = "removed_duplicates")]
    pub duplicates_removed: usize,
}
