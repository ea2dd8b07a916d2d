//! Access to the `INTEGRACAO_PROMOCAO` staging table for the
//! normalization sweep.
//!
//! All operations run inside a [`NormalizationSweep`]: one transaction per
//! pass, committed only when the whole sweep succeeds, with per-row
//! savepoints around updates so one broken row cannot poison the rest.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Acquire, PgPool, Postgres, Transaction};
use tracing::debug;

use crate::database::with_timeout;
use crate::errors::{IntegraError, IntegraResult};
use crate::models::NormalizationRow;

#[async_trait]
pub trait NormalizationRepository: Send + Sync {
    /// Opens the transaction wrapping one normalization sweep.
    async fn begin(&self) -> IntegraResult<Box<dyn NormalizationSweep>>;
}

/// One normalization pass. Effects become visible only on
/// [`commit`](NormalizationSweep::commit); dropping the sweep rolls
/// everything back.
#[async_trait]
pub trait NormalizationSweep: Send {
    /// Every staging row, in id order.
    async fn list_all(&mut self) -> IntegraResult<Vec<NormalizationRow>>;

    /// Writes the normalized JSON back, keyed by the full identity of the
    /// row so a concurrently replaced row is left alone.
    async fn update(
        &mut self,
        row: &NormalizationRow,
        payload: &str,
        updated_at: DateTime<Utc>,
    ) -> IntegraResult<()>;

    async fn commit(self: Box<Self>) -> IntegraResult<()>;
}

pub struct PgNormalizationRepository {
    pool: PgPool,
}

impl PgNormalizationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NormalizationRepository for PgNormalizationRepository {
    async fn begin(&self) -> IntegraResult<Box<dyn NormalizationSweep>> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|err| IntegraError::Database(format!("begin: {err}")))?;
        Ok(Box::new(PgNormalizationSweep { tx }))
    }
}

struct PgNormalizationSweep {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl NormalizationSweep for PgNormalizationSweep {
    async fn list_all(&mut self) -> IntegraResult<Vec<NormalizationRow>> {
        let rows = with_timeout("promotion_norm.list_all", async {
            sqlx::query_as::<_, NormalizationRow>(
                r#"
                SELECT ID_INTEGRACAO_PROMOCAO AS id,
                       ID_REVENDEDOR AS dealer_id,
                       ID_PROMOCAO AS promotion_id,
                       JSON::text AS payload,
                       DATA_ATUALIZACAO AS updated_at,
                       DATA_RECEBIMENTO AS received_at,
                       ENVIANDO AS sending,
                       TRANSACAO AS transaction,
                       DATA_INICIO_ENVIO AS send_started_at
                FROM INTEGRACAO_PROMOCAO
                ORDER BY ID_INTEGRACAO_PROMOCAO ASC
                "#,
            )
            .fetch_all(&mut *self.tx)
            .await
        })
        .await?;

        debug!(count = rows.len(), "normalization rows listed");
        Ok(rows)
    }

    async fn update(
        &mut self,
        row: &NormalizationRow,
        payload: &str,
        updated_at: DateTime<Utc>,
    ) -> IntegraResult<()> {
        // Row updates run under a savepoint so one broken row cannot
        // poison the sweep transaction.
        let mut savepoint = self
            .tx
            .begin()
            .await
            .map_err(|err| IntegraError::Database(format!("savepoint: {err}")))?;

        match with_timeout("promotion_norm.update", async {
            sqlx::query(
                r#"
                UPDATE INTEGRACAO_PROMOCAO
                SET JSON = $1, DATA_ATUALIZACAO = $2
                WHERE ID_INTEGRACAO_PROMOCAO = $3
                  AND ID_REVENDEDOR = $4
                  AND ID_PROMOCAO = $5
                "#,
            )
            .bind(payload)
            .bind(updated_at)
            .bind(row.id)
            .bind(row.dealer_id)
            .bind(row.promotion_id)
            .execute(&mut *savepoint)
            .await
        })
        .await
        {
            Ok(_) => {
                savepoint
                    .commit()
                    .await
                    .map_err(|err| IntegraError::Database(format!("savepoint commit: {err}")))?;
                debug!(id = row.id, "normalization row rewritten");
                Ok(())
            }
            Err(err) => {
                let _ = savepoint.rollback().await;
                Err(err)
            }
        }
    }

    async fn commit(self: Box<Self>) -> IntegraResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|err| IntegraError::Database(format!("commit: {err}")))
    }
}
