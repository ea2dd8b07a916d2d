//! Integration cleanup types: purge modes and expired combo rows.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// How a cleanup operation disposes of rows older than the cutoff.
///
/// `Soft` marks rows `STATUS_PROCESSAMENTO = 'REMOVIDO'`; `Hard` deletes
/// them. The legacy stored procedures take the flag as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurgeMode {
    Soft,
    Hard,
}

impl PurgeMode {
    /// Legacy flag value expected by the stored procedures.
    pub fn as_flag(&self) -> &'static str {
        match self {
            PurgeMode::Soft => "NAO",
            PurgeMode::Hard => "SIM",
        }
    }
}

/// An expired row of `INTEGR_COMBO`, enumerated so the purge can delete
/// row-by-row and skip failures.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct IntegrationCombo {
    pub id: i64,
    pub dealer_id: Option<i64>,
    pub combo_promotion_id: Option<i64>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn purge_flags_match_the_legacy_procedure_contract() {
        assert_eq!(PurgeMode::Soft.as_flag(), "NAO");
        assert_eq!(PurgeMode::Hard.as_flag(), "SIM");
    }
}
