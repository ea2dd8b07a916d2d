//! Cleanup, staging-move and SLA-expiry operations.
//!
//! Every method takes an explicit connection: the integration-job pipeline
//! runs them on one transaction so cleanup and move/expiry become visible
//! together or not at all.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use tracing::debug;

use crate::database::with_timeout;
use crate::errors::IntegraResult;
use crate::models::{IntegrationCombo, PurgeMode};

#[async_trait]
pub trait IntegrationRepository: Send + Sync {
    async fn remove_combo(
        &self,
        conn: &mut PgConnection,
        cutoff: DateTime<Utc>,
        mode: PurgeMode,
    ) -> IntegraResult<()>;

    async fn remove_packaging(
        &self,
        conn: &mut PgConnection,
        cutoff: DateTime<Utc>,
        mode: PurgeMode,
    ) -> IntegraResult<()>;

    async fn remove_marketing_structure(
        &self,
        conn: &mut PgConnection,
        cutoff: DateTime<Utc>,
        mode: PurgeMode,
    ) -> IntegraResult<()>;

    async fn remove_product(
        &self,
        conn: &mut PgConnection,
        cutoff: DateTime<Utc>,
        mode: PurgeMode,
    ) -> IntegraResult<()>;

    async fn remove_promotion(
        &self,
        conn: &mut PgConnection,
        cutoff: DateTime<Utc>,
        mode: PurgeMode,
    ) -> IntegraResult<()>;

    async fn move_marketing_structure(
        &self,
        conn: &mut PgConnection,
        cutoff: DateTime<Utc>,
    ) -> IntegraResult<()>;

    async fn move_product(
        &self,
        conn: &mut PgConnection,
        cutoff: DateTime<Utc>,
    ) -> IntegraResult<()>;

    async fn move_packaging(
        &self,
        conn: &mut PgConnection,
        cutoff: DateTime<Utc>,
    ) -> IntegraResult<()>;

    async fn move_combo(
        &self,
        conn: &mut PgConnection,
        cutoff: DateTime<Utc>,
    ) -> IntegraResult<()>;

    async fn move_promotion(
        &self,
        conn: &mut PgConnection,
        cutoff: DateTime<Utc>,
    ) -> IntegraResult<()>;

    /// Combos older than the cutoff, enumerated so the purge can delete
    /// row-by-row and keep going past failures.
    async fn expired_combos(
        &self,
        conn: &mut PgConnection,
        cutoff: DateTime<Utc>,
    ) -> IntegraResult<Vec<IntegrationCombo>>;

    async fn delete_combo(&self, conn: &mut PgConnection, id: i64) -> IntegraResult<()>;

    /// Transitions `STATUS = 'ATIVO'` rows whose SLA has lapsed to
    /// `'EXPIRADO'`.
    async fn update_expired_sla(&self, conn: &mut PgConnection) -> IntegraResult<()>;
}

pub struct PgIntegrationRepository;

impl PgIntegrationRepository {
    pub fn new() -> Self {
        Self
    }

    /// Shared shape of the soft/hard cleanup for the table-backed domains.
    async fn clear_by_cutoff(
        conn: &mut PgConnection,
        operation: &str,
        table: &str,
        cutoff: DateTime<Utc>,
        mode: PurgeMode,
    ) -> IntegraResult<()> {
        let sql = match mode {
            PurgeMode::Hard => format!("DELETE FROM {table} WHERE DATA_INTEGRACAO < $1"),
            PurgeMode::Soft => format!(
                "UPDATE {table} SET STATUS_PROCESSAMENTO = 'REMOVIDO' WHERE DATA_INTEGRACAO < $1"
            ),
        };

        with_timeout(operation, async {
            sqlx::query(&sql).bind(cutoff).execute(&mut *conn).await
        })
        .await?;

        debug!(operation, flag = mode.as_flag(), %cutoff, "cleanup executed");
        Ok(())
    }
}

impl Default for PgIntegrationRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IntegrationRepository for PgIntegrationRepository {
    async fn remove_combo(
        &self,
        conn: &mut PgConnection,
        cutoff: DateTime<Utc>,
        mode: PurgeMode,
    ) -> IntegraResult<()> {
        // Combos go through the legacy procedure, which owns the soft/hard
        // distinction internally.
        with_timeout("integration.remove_combo", async {
            sqlx::query("SELECT sp_limparintegracaocombocorte($1, $2)")
                .bind(cutoff)
                .bind(mode.as_flag())
                .execute(&mut *conn)
                .await
        })
        .await?;

        debug!(flag = mode.as_flag(), %cutoff, "combo cleanup executed");
        Ok(())
    }

    async fn remove_packaging(
        &self,
        conn: &mut PgConnection,
        cutoff: DateTime<Utc>,
        mode: PurgeMode,
    ) -> IntegraResult<()> {
        Self::clear_by_cutoff(
            conn,
            "integration.remove_packaging",
            "INTEGR_EMBALAGEM",
            cutoff,
            mode,
        )
        .await
    }

    async fn remove_marketing_structure(
        &self,
        conn: &mut PgConnection,
        cutoff: DateTime<Utc>,
        mode: PurgeMode,
    ) -> IntegraResult<()> {
        Self::clear_by_cutoff(
            conn,
            "integration.remove_marketing_structure",
            "INTEGR_ESTRUTURA_MERCADOLOGICA",
            cutoff,
            mode,
        )
        .await
    }

    async fn remove_product(
        &self,
        conn: &mut PgConnection,
        cutoff: DateTime<Utc>,
        mode: PurgeMode,
    ) -> IntegraResult<()> {
        Self::clear_by_cutoff(
            conn,
            "integration.remove_product",
            "INTEGR_PRODUTO",
            cutoff,
            mode,
        )
        .await
    }

    async fn remove_promotion(
        &self,
        conn: &mut PgConnection,
        cutoff: DateTime<Utc>,
        mode: PurgeMode,
    ) -> IntegraResult<()> {
        Self::clear_by_cutoff(
            conn,
            "integration.remove_promotion",
            "INTEGR_PROMOCAO",
            cutoff,
            mode,
        )
        .await
    }

    async fn move_marketing_structure(
        &self,
        conn: &mut PgConnection,
        cutoff: DateTime<Utc>,
    ) -> IntegraResult<()> {
        with_timeout("integration.move_marketing_structure", async {
            sqlx::query("SELECT sp_moverstagingestruturamercadologica($1)")
                .bind(cutoff)
                .execute(&mut *conn)
                .await
        })
        .await?;
        Ok(())
    }

    async fn move_product(
        &self,
        conn: &mut PgConnection,
        cutoff: DateTime<Utc>,
    ) -> IntegraResult<()> {
        with_timeout("integration.move_product", async {
            sqlx::query("SELECT sp_moverstagingproduto($1)")
                .bind(cutoff)
                .execute(&mut *conn)
                .await
        })
        .await?;
        Ok(())
    }

    async fn move_packaging(
        &self,
        conn: &mut PgConnection,
        cutoff: DateTime<Utc>,
    ) -> IntegraResult<()> {
        with_timeout("integration.move_packaging", async {
            sqlx::query("SELECT sp_moverstagingembalagem($1)")
                .bind(cutoff)
                .execute(&mut *conn)
                .await
        })
        .await?;
        Ok(())
    }

    async fn move_combo(
        &self,
        conn: &mut PgConnection,
        cutoff: DateTime<Utc>,
    ) -> IntegraResult<()> {
        with_timeout("integration.move_combo", async {
            sqlx::query("SELECT sp_moverstagingcombo($1)")
                .bind(cutoff)
                .execute(&mut *conn)
                .await
        })
        .await?;
        Ok(())
    }

    async fn move_promotion(
        &self,
        conn: &mut PgConnection,
        cutoff: DateTime<Utc>,
    ) -> IntegraResult<()> {
        with_timeout("integration.move_promotion", async {
            sqlx::query("SELECT sp_moverstagingpromocao($1)")
                .bind(cutoff)
                .execute(&mut *conn)
                .await
        })
        .await?;
        Ok(())
    }

    async fn expired_combos(
        &self,
        conn: &mut PgConnection,
        cutoff: DateTime<Utc>,
    ) -> IntegraResult<Vec<IntegrationCombo>> {
        let combos = with_timeout("integration.expired_combos", async {
            sqlx::query_as::<_, IntegrationCombo>(
                r#"
                SELECT ID_INTEGRACAO_COMBO AS id,
                       ID_REVENDEDOR AS dealer_id,
                       ID_COMBO_PROMOCAO AS combo_promotion_id,
                       DATA_ATUALIZACAO AS updated_at
                FROM INTEGR_COMBO
                WHERE DATA_ATUALIZACAO < $1
                "#,
            )
            .bind(cutoff)
            .fetch_all(&mut *conn)
            .await
        })
        .await?;

        debug!(count = combos.len(), %cutoff, "expired combos listed");
        Ok(combos)
    }

    async fn delete_combo(&self, conn: &mut PgConnection, id: i64) -> IntegraResult<()> {
        with_timeout("integration.delete_combo", async {
            sqlx::query("DELETE FROM INTEGR_COMBO WHERE ID_INTEGRACAO_COMBO = $1")
                .bind(id)
                .execute(&mut *conn)
                .await
        })
        .await?;
        Ok(())
    }

    async fn update_expired_sla(&self, conn: &mut PgConnection) -> IntegraResult<()> {
        with_timeout("integration.update_expired_sla", async {
            sqlx::query("SELECT sp_atualizarvencimentoslasolicitacoes()")
                .execute(&mut *conn)
                .await
        })
        .await?;

        debug!("expired SLA solicitations updated");
        Ok(())
    }
}
