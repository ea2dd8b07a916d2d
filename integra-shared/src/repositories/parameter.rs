//! Access to the `PARAMETROS` tuning table.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use crate::database::with_timeout;
use crate::errors::{IntegraError, IntegraResult};
use crate::models::Parameter;

#[async_trait]
pub trait ParameterRepository: Send + Sync {
    /// Looks a parameter up by code; absence is not an error.
    async fn get_by_code(&self, code: &str) -> IntegraResult<Option<Parameter>>;

    /// Rewrites a parameter's value, keyed by code and environment.
    async fn update(&self, param: &Parameter) -> IntegraResult<()>;
}

pub struct PgParameterRepository {
    pool: PgPool,
}

impl PgParameterRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ParameterRepository for PgParameterRepository {
    async fn get_by_code(&self, code: &str) -> IntegraResult<Option<Parameter>> {
        let param = with_timeout("parameter.get_by_code", async {
            sqlx::query_as::<_, Parameter>(
                r#"
                SELECT CODIGO AS code, VALOR AS value, AMBIENTE AS environment
                FROM PARAMETROS
                WHERE CODIGO = $1
                "#,
            )
            .bind(code)
            .fetch_optional(&self.pool)
            .await
        })
        .await?;

        match &param {
            Some(found) => debug!(code, value = %found.value, "parameter found"),
            None => debug!(code, "parameter not found"),
        }
        Ok(param)
    }

    async fn update(&self, param: &Parameter) -> IntegraResult<()> {
        let result = with_timeout("parameter.update", async {
            sqlx::query(
                r#"
                UPDATE PARAMETROS
                SET VALOR = $1
                WHERE CODIGO = $2 AND AMBIENTE = $3
                "#,
            )
            .bind(&param.value)
            .bind(&param.code)
            .bind(&param.environment)
            .execute(&self.pool)
            .await
        })
        .await?;

        if result.rows_affected() == 0 {
            return Err(IntegraError::Database(format!(
                "parameter not found for update: {}",
                param.code
            )));
        }
        debug!(code = %param.code, "parameter updated");
        Ok(())
    }
}
