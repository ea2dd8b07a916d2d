//! Database pool construction and the shared per-call timeout wrapper.

use std::future::Future;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::constants::DB_OPERATION_TIMEOUT;
use crate::errors::{IntegraError, IntegraResult};

/// Builds the shared connection pool. `max_connections` should cover the
/// worker count plus a little headroom for the pipeline transaction.
pub async fn connect_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .test_before_acquire(true)
        .connect(database_url)
        .await
}

/// Applies the standard 30 s timeout to a database operation and maps both
/// failure modes into [`IntegraError`].
pub async fn with_timeout<T, F>(operation: &str, fut: F) -> IntegraResult<T>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    run_with_timeout(operation, DB_OPERATION_TIMEOUT, fut).await
}

async fn run_with_timeout<T, F>(operation: &str, limit: Duration, fut: F) -> IntegraResult<T>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(IntegraError::Database(format!("{operation}: {err}"))),
        Err(_) => Err(IntegraError::Timeout {
            operation: operation.to_string(),
            seconds: limit.as_secs(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn timeout_maps_to_timeout_error() {
        let result: IntegraResult<()> = run_with_timeout(
            "slow_operation",
            Duration::from_millis(10),
            async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            },
        )
        .await;

        match result {
            Err(IntegraError::Timeout { operation, .. }) => {
                assert_eq!(operation, "slow_operation");
            }
            other => panic!("expected timeout error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn inner_error_maps_to_database_error() {
        let result: IntegraResult<()> = run_with_timeout(
            "failing_operation",
            Duration::from_secs(1),
            async { Err(sqlx::Error::PoolClosed) },
        )
        .await;

        match result {
            Err(IntegraError::Database(message)) => {
                assert!(message.starts_with("failing_operation:"));
            }
            other => panic!("expected database error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn success_passes_through() {
        let result = run_with_timeout("ok_operation", Duration::from_secs(1), async { Ok(7_i64) })
            .await
            .unwrap();
        assert_eq!(result, 7);
    }
}
