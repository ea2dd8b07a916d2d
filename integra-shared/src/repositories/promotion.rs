//! Access to the `INTEGR_RMS_PROMOCAO_IN` staging table and the promotion
//! integration procedure.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, warn};

use crate::constants::DB_OPERATION_TIMEOUT;
use crate::database::with_timeout;
use crate::errors::{IntegraError, IntegraResult};
use crate::models::{ProcedureResult, PromotionRow};

#[async_trait]
pub trait PromotionRepository: Send + Sync {
    /// Runs `pkg_integra_promocao.prc_integra_hermes` for one staging row.
    /// Business failures raised by the procedure come back as a failed
    /// [`ProcedureResult`]; connection-level errors propagate.
    async fn run_procedure(&self, id: i64) -> IntegraResult<ProcedureResult>;

    /// All pending rows, oldest first.
    async fn list_pending(&self) -> IntegraResult<Vec<PromotionRow>>;

    /// Removes a processed row.
    async fn delete(&self, id: i64) -> IntegraResult<()>;
}

pub struct PgPromotionRepository {
    pool: PgPool,
}

impl PgPromotionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PromotionRepository for PgPromotionRepository {
    async fn run_procedure(&self, id: i64) -> IntegraResult<ProcedureResult> {
        let call = sqlx::query("SELECT pkg_integra_promocao.prc_integra_hermes($1)")
            .bind(id)
            .execute(&self.pool);

        let outcome = tokio::time::timeout(DB_OPERATION_TIMEOUT, call)
            .await
            .map_err(|_| IntegraError::Timeout {
                operation: "promotion.run_procedure".to_string(),
                seconds: DB_OPERATION_TIMEOUT.as_secs(),
            })?;

        match outcome {
            Ok(_) => Ok(ProcedureResult::success()),
            // Errors raised inside the procedure are business failures; the
            // caller records them and moves on.
            Err(sqlx::Error::Database(db_err)) => {
                warn!(id, error = %db_err, "promotion procedure reported failure");
                Ok(ProcedureResult::failure(format!(
                    "Erro ao executar procedimento: {db_err}"
                )))
            }
            Err(err) => Err(IntegraError::Database(format!(
                "promotion.run_procedure: {err}"
            ))),
        }
    }

    async fn list_pending(&self) -> IntegraResult<Vec<PromotionRow>> {
        let rows = with_timeout("promotion.list_pending", async {
            sqlx::query_as::<_, PromotionRow>(
                r#"
                SELECT IPMD_ID AS id,
                       JSON_DATA::text AS payload,
                       DATARECEBIMENTO::text AS received_at
                FROM INTEGR_RMS_PROMOCAO_IN
                ORDER BY DATARECEBIMENTO
                "#,
            )
            .fetch_all(&self.pool)
            .await
        })
        .await?;

        debug!(count = rows.len(), "pending promotions listed");
        Ok(rows)
    }

    async fn delete(&self, id: i64) -> IntegraResult<()> {
        let result = with_timeout("promotion.delete", async {
            sqlx::query("DELETE FROM INTEGR_RMS_PROMOCAO_IN WHERE IPMD_ID = $1")
                .bind(id)
                .execute(&self.pool)
                .await
        })
        .await?;

        if result.rows_affected() == 0 {
            return Err(IntegraError::Database(format!(
                "promotion not found for deletion: {id}"
            )));
        }
        debug!(id, "promotion row deleted");
        Ok(())
    }
}
