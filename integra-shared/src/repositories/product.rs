//! Access to the `INTEGR_RMS_PRODUTO_IN` staging table and the product
//! integration procedure.
//!
//! The pending snapshot is read on the pool. Per-row work happens inside a
//! [`ProductImportSweep`]: one transaction wrapping the whole import, with
//! per-row savepoints so a failed row cannot poison it.

use async_trait::async_trait;
use sqlx::{Acquire, PgPool, Postgres, Transaction};
use tracing::{debug, warn};

use crate::constants::DB_OPERATION_TIMEOUT;
use crate::database::with_timeout;
use crate::errors::{IntegraError, IntegraResult};
use crate::models::{ProcedureResult, ProductRow};

#[async_trait]
pub trait ProductImportRepository: Send + Sync {
    /// All pending rows, oldest first. This is the snapshot the import
    /// sweep works through.
    async fn list_pending(&self) -> IntegraResult<Vec<ProductRow>>;

    /// Opens the transaction wrapping one import sweep.
    async fn begin(&self) -> IntegraResult<Box<dyn ProductImportSweep>>;
}

/// One import sweep. Procedure and delete calls share a transaction whose
/// effects become visible only on [`commit`](ProductImportSweep::commit);
/// dropping the sweep rolls everything back.
#[async_trait]
pub trait ProductImportSweep: Send {
    /// Runs `pkg_integra_produto.prc_integra_hermes` for one staging row.
    /// Business failures raised by the procedure come back as a failed
    /// [`ProcedureResult`]; connection-level errors propagate.
    async fn run_procedure(&mut self, id: i64) -> IntegraResult<ProcedureResult>;

    /// Removes a processed row, success or not.
    async fn delete(&mut self, id: i64) -> IntegraResult<()>;

    async fn commit(self: Box<Self>) -> IntegraResult<()>;
}

pub struct PgProductImportRepository {
    pool: PgPool,
}

impl PgProductImportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductImportRepository for PgProductImportRepository {
    async fn list_pending(&self) -> IntegraResult<Vec<ProductRow>> {
        let rows = with_timeout("product.list_pending", async {
            sqlx::query_as::<_, ProductRow>(
                r#"
                SELECT IPR_ID AS id,
                       JSON::text AS payload,
                       DATARECEBIMENTO::text AS received_at
                FROM INTEGR_RMS_PRODUTO_IN
                ORDER BY DATARECEBIMENTO ASC
                "#,
            )
            .fetch_all(&self.pool)
            .await
        })
        .await?;

        debug!(count = rows.len(), "pending product rows listed");
        Ok(rows)
    }

    async fn begin(&self) -> IntegraResult<Box<dyn ProductImportSweep>> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|err| IntegraError::Database(format!("begin: {err}")))?;
        Ok(Box::new(PgProductImportSweep { tx }))
    }
}

struct PgProductImportSweep {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl ProductImportSweep for PgProductImportSweep {
    async fn run_procedure(&mut self, id: i64) -> IntegraResult<ProcedureResult> {
        // The procedure runs under a savepoint so a failed row does not
        // poison the sweep transaction.
        let mut savepoint = self
            .tx
            .begin()
            .await
            .map_err(|err| IntegraError::Database(format!("savepoint: {err}")))?;

        let call = sqlx::query("SELECT pkg_integra_produto.prc_integra_hermes($1)")
            .bind(id)
            .execute(&mut *savepoint);

        let outcome = tokio::time::timeout(DB_OPERATION_TIMEOUT, call)
            .await
            .map_err(|_| IntegraError::Timeout {
                operation: "product.run_procedure".to_string(),
                seconds: DB_OPERATION_TIMEOUT.as_secs(),
            })?;

        match outcome {
            Ok(_) => match savepoint.commit().await {
                Ok(()) => Ok(ProcedureResult::success()),
                Err(err) => Ok(ProcedureResult::failure(format!(
                    "savepoint commit: {err}"
                ))),
            },
            Err(sqlx::Error::Database(db_err)) => {
                let _ = savepoint.rollback().await;
                warn!(id, error = %db_err, "product procedure reported failure");
                Ok(ProcedureResult::failure(format!(
                    "Error executing product procedure: {db_err}"
                )))
            }
            Err(err) => {
                let _ = savepoint.rollback().await;
                Err(IntegraError::Database(format!(
                    "product.run_procedure: {err}"
                )))
            }
        }
    }

    async fn delete(&mut self, id: i64) -> IntegraResult<()> {
        let mut savepoint = self
            .tx
            .begin()
            .await
            .map_err(|err| IntegraError::Database(format!("savepoint: {err}")))?;

        match with_timeout("product.delete", async {
            sqlx::query("DELETE FROM INTEGR_RMS_PRODUTO_IN WHERE IPR_ID = $1")
                .bind(id)
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
                debug!(id, "product row deleted");
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
