//! Operator-tunable parameters stored in the `PARAMETROS` table.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::constants::GLOBAL_ENVIRONMENT;

/// A single tuning knob. `environment == "*"` means the value applies
/// globally; the pipeline only rewrites last-run timestamps under that gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Parameter {
    pub code: String,
    pub value: String,
    pub environment: String,
}

impl Parameter {
    pub fn is_global(&self) -> bool {
        self.environment == GLOBAL_ENVIRONMENT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_gate_matches_star_only() {
        let mut param = Parameter {
            code: "RemoverTransacaoUltimaExecucao".to_string(),
            value: "2025-01-01".to_string(),
            environment: "*".to_string(),
        };
        assert!(param.is_global());

        param.environment = "HOMOLOG".to_string();
        assert!(!param.is_global());
    }
}
