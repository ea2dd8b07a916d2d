//! Network replication operations.
//!
//! The two dealer probes only signal success or failure; their result sets
//! are discarded by the sweep, so they return unit.

use async_trait::async_trait;
use sqlx::PgConnection;
use tracing::debug;

use crate::database::with_timeout;
use crate::errors::IntegraResult;
use crate::models::{Dealer, Network};

#[async_trait]
pub trait NetworkRepository: Send + Sync {
    /// Every replication-enabled network.
    async fn list_networks(&self, conn: &mut PgConnection) -> IntegraResult<Vec<Network>>;

    /// Dealers grouped under a principal dealer.
    async fn list_dealers(
        &self,
        conn: &mut PgConnection,
        principal_dealer_id: i64,
    ) -> IntegraResult<Vec<Dealer>>;

    /// Network-level product replication.
    async fn replicate(&self, conn: &mut PgConnection, network_id: i64) -> IntegraResult<()>;

    /// Read-only probe of the dealer's replicated product set.
    async fn replicated_by_dealer(
        &self,
        conn: &mut PgConnection,
        dealer_id: i64,
    ) -> IntegraResult<()>;

    /// Read-only probe of the dealer's replication-candidate set.
    async fn candidates(&self, conn: &mut PgConnection, dealer_id: i64) -> IntegraResult<()>;
}

pub struct PgNetworkRepository;

impl PgNetworkRepository {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PgNetworkRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NetworkRepository for PgNetworkRepository {
    async fn list_networks(&self, conn: &mut PgConnection) -> IntegraResult<Vec<Network>> {
        let networks = with_timeout("network.list_networks", async {
            sqlx::query_as::<_, Network>(
                r#"
                SELECT ID_REDE AS network_id, ID_REVENDEDOR AS dealer_id
                FROM REDES
                ORDER BY ID_REDE
                "#,
            )
            .fetch_all(&mut *conn)
            .await
        })
        .await?;

        debug!(count = networks.len(), "networks listed");
        Ok(networks)
    }

    async fn list_dealers(
        &self,
        conn: &mut PgConnection,
        principal_dealer_id: i64,
    ) -> IntegraResult<Vec<Dealer>> {
        let dealers = with_timeout("network.list_dealers", async {
            sqlx::query_as::<_, Dealer>(
                r#"
                SELECT ID_REVENDEDOR AS dealer_id
                FROM REVENDEDOR_REDE
                WHERE ID_REVENDEDOR_PRINCIPAL = $1
                "#,
            )
            .bind(principal_dealer_id)
            .fetch_all(&mut *conn)
            .await
        })
        .await?;

        debug!(
            principal = principal_dealer_id,
            count = dealers.len(),
            "network dealers listed"
        );
        Ok(dealers)
    }

    async fn replicate(&self, conn: &mut PgConnection, network_id: i64) -> IntegraResult<()> {
        with_timeout("network.replicate", async {
            sqlx::query(
                "UPDATE PRODUTOS_REDE SET STATUS_REPLICACAO = 'ATIVO' WHERE ID_REDE = $1",
            )
            .bind(network_id)
            .execute(&mut *conn)
            .await
        })
        .await?;

        debug!(network_id, "network products replicated");
        Ok(())
    }

    async fn replicated_by_dealer(
        &self,
        conn: &mut PgConnection,
        dealer_id: i64,
    ) -> IntegraResult<()> {
        with_timeout("network.replicated_by_dealer", async {
            sqlx::query("SELECT ID_PRODUTO FROM PRODUTOS_REPLICADOS WHERE ID_REVENDEDOR = $1")
                .bind(dealer_id)
                .fetch_all(&mut *conn)
                .await
        })
        .await?;
        Ok(())
    }

    async fn candidates(&self, conn: &mut PgConnection, dealer_id: i64) -> IntegraResult<()> {
        with_timeout("network.candidates", async {
            sqlx::query(
                r#"
                SELECT COD
                FROM PRODUTOS
                WHERE ID_REVENDEDOR = $1 AND STATUS_REPLICACAO = 'PENDENTE'
                "#,
            )
            .bind(dealer_id)
            .fetch_all(&mut *conn)
            .await
        })
        .await?;
        Ok(())
    }
}
