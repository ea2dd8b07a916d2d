//! Composite housekeeping pipeline: cleanup, purge, replication sweep,
//! staging move and SLA expiry, driven by database parameters.
//!
//! Runs at the tail of every promotion message and as the body of a
//! `mover` message. A missing `REMOVER_TRANSACAO_MINUTOS` parameter
//! disables the whole pipeline; a non-numeric value is fatal.
//!
//! The database steps (removal, purge, replication, move, expiry) share one
//! transaction committed only after the last step succeeds, so observers
//! never see a cleaned-but-not-moved state. Parameter timestamp rewrites
//! run on the pool outside that transaction: concurrent runs race on them
//! and the last writer wins, with no correctness invariant attached.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use sqlx::{Acquire, PgPool, Postgres, Transaction};
use tracing::{info, warn};

use integra_shared::constants::{
    GLOBAL_ENVIRONMENT, PARAM_PURGE_DAYS, PARAM_PURGE_LAST_RUN,
    PARAM_REMOVE_LAST_RUN, PARAM_REMOVE_TRANSACTION_MINUTES,
};
use integra_shared::errors::{IntegraError, IntegraResult};
use integra_shared::models::PurgeMode;
use integra_shared::repositories::{
    IntegrationRepository, NetworkRepository, ParameterRepository,
};

pub struct IntegrationJobPipeline {
    pool: PgPool,
    parameters: Arc<dyn ParameterRepository>,
    integration: Arc<dyn IntegrationRepository>,
    network: Arc<dyn NetworkRepository>,
}

impl IntegrationJobPipeline {
    pub fn new(
        pool: PgPool,
        parameters: Arc<dyn ParameterRepository>,
        integration: Arc<dyn IntegrationRepository>,
        network: Arc<dyn NetworkRepository>,
    ) -> Self {
        Self {
            pool,
            parameters,
            integration,
            network,
        }
    }

    /// Runs the full pipeline. `cutoff` drives the staging move: the
    /// promotion tail and the `mover` message both pass the current time.
    pub async fn run(&self, cutoff: DateTime<Utc>) -> IntegraResult<()> {
        info!("integration job started");

        let Some(minutes_param) = self
            .parameters
            .get_by_code(PARAM_REMOVE_TRANSACTION_MINUTES)
            .await?
        else {
            info!(
                parameter = PARAM_REMOVE_TRANSACTION_MINUTES,
                "transaction removal disabled: parameter absent"
            );
            return Ok(());
        };

        let minutes: i64 = minutes_param.value.trim().parse().map_err(|_| {
            IntegraError::non_numeric_parameter(
                PARAM_REMOVE_TRANSACTION_MINUTES,
                minutes_param.value.clone(),
            )
        })?;

        let purge_param = self
            .parameters
            .get_by_code(PARAM_PURGE_DAYS)
            .await?
            .ok_or_else(|| {
                IntegraError::Configuration(format!("parameter {PARAM_PURGE_DAYS} is absent"))
            })?;
        let purge_days: i64 = purge_param.value.trim().parse().map_err(|_| {
            IntegraError::non_numeric_parameter(PARAM_PURGE_DAYS, purge_param.value.clone())
        })?;

        let now = Utc::now();
        let cutoff_tx = now - Duration::minutes(minutes);
        let cutoff_purge = now - Duration::days(purge_days);
        info!(%cutoff_tx, %cutoff_purge, "cutoffs computed");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|err| IntegraError::Database(format!("begin: {err}")))?;

        self.remove_transactions(&mut tx, cutoff_tx).await?;
        self.touch_parameter(PARAM_REMOVE_LAST_RUN).await?;

        self.purge_transactions(&mut tx, cutoff_purge).await?;
        self.touch_parameter(PARAM_PURGE_LAST_RUN).await?;

        self.replicate_networks(&mut tx).await?;
        self.move_staging(&mut tx, cutoff).await?;
        self.integration.update_expired_sla(&mut tx).await?;

        tx.commit()
            .await
            .map_err(|err| IntegraError::Database(format!("commit: {err}")))?;

        info!("integration job finished");
        Ok(())
    }

    /// Soft removal of the five integration domains.
    async fn remove_transactions(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        cutoff: DateTime<Utc>,
    ) -> IntegraResult<()> {
        info!(%cutoff, "transaction removal started");
        self.integration
            .remove_combo(&mut *tx, cutoff, PurgeMode::Soft)
            .await?;
        self.integration
            .remove_packaging(&mut *tx, cutoff, PurgeMode::Soft)
            .await?;
        self.integration
            .remove_marketing_structure(&mut *tx, cutoff, PurgeMode::Soft)
            .await?;
        self.integration
            .remove_product(&mut *tx, cutoff, PurgeMode::Soft)
            .await?;
        self.integration
            .remove_promotion(&mut *tx, cutoff, PurgeMode::Soft)
            .await?;
        info!("transaction removal finished");
        Ok(())
    }

    /// Hard purge of the five domains. Combos are enumerated and deleted
    /// row-by-row so one stuck row only costs itself.
    async fn purge_transactions(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        cutoff: DateTime<Utc>,
    ) -> IntegraResult<()> {
        info!(%cutoff, "purge started");
        self.purge_combos(tx, cutoff).await?;
        self.integration
            .remove_packaging(&mut *tx, cutoff, PurgeMode::Hard)
            .await?;
        self.integration
            .remove_marketing_structure(&mut *tx, cutoff, PurgeMode::Hard)
            .await?;
        self.integration
            .remove_product(&mut *tx, cutoff, PurgeMode::Hard)
            .await?;
        self.integration
            .remove_promotion(&mut *tx, cutoff, PurgeMode::Hard)
            .await?;
        info!("purge finished");
        Ok(())
    }

    async fn purge_combos(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        cutoff: DateTime<Utc>,
    ) -> IntegraResult<()> {
        let combos = self.integration.expired_combos(&mut *tx, cutoff).await?;
        for combo in combos {
            let mut savepoint = tx
                .begin()
                .await
                .map_err(|err| IntegraError::Database(format!("savepoint: {err}")))?;
            match self.integration.delete_combo(&mut savepoint, combo.id).await {
                Ok(()) => {
                    savepoint.commit().await.map_err(|err| {
                        IntegraError::Database(format!("savepoint commit: {err}"))
                    })?;
                }
                Err(err) => {
                    let _ = savepoint.rollback().await;
                    warn!(combo = combo.id, error = %err, "failed to delete expired combo");
                }
            }
        }
        Ok(())
    }

    /// Rewrites a last-run timestamp parameter, gated on the global
    /// environment marker.
    async fn touch_parameter(&self, code: &str) -> IntegraResult<()> {
        if let Some(mut param) = self.parameters.get_by_code(code).await? {
            if param.environment == GLOBAL_ENVIRONMENT {
                param.value = Utc::now().to_rfc3339();
                self.parameters.update(&param).await?;
            }
        }
        Ok(())
    }

    /// Network replication sweep. Per-network and per-dealer failures log
    /// and continue; each fallible operation runs under a savepoint so a
    /// failure cannot poison the pipeline transaction.
    async fn replicate_networks(
        &self,
        tx: &mut Transaction<'static, Postgres>,
    ) -> IntegraResult<()> {
        info!("network replication sweep started");
        let networks = self.network.list_networks(&mut *tx).await?;

        for net in &networks {
            let mut savepoint = tx
                .begin()
                .await
                .map_err(|err| IntegraError::Database(format!("savepoint: {err}")))?;
            let dealers = match self
                .network
                .list_dealers(&mut savepoint, net.dealer_id)
                .await
            {
                Ok(dealers) => {
                    savepoint.commit().await.map_err(|err| {
                        IntegraError::Database(format!("savepoint commit: {err}"))
                    })?;
                    dealers
                }
                Err(err) => {
                    let _ = savepoint.rollback().await;
                    warn!(dealer = net.dealer_id, error = %err, "failed to list network dealers");
                    continue;
                }
            };

            let mut savepoint = tx
                .begin()
                .await
                .map_err(|err| IntegraError::Database(format!("savepoint: {err}")))?;
            match self.network.replicate(&mut savepoint, net.network_id).await {
                Ok(()) => {
                    savepoint.commit().await.map_err(|err| {
                        IntegraError::Database(format!("savepoint commit: {err}"))
                    })?;
                }
                Err(err) => {
                    let _ = savepoint.rollback().await;
                    warn!(network = net.network_id, error = %err, "failed to replicate network products");
                    continue;
                }
            }

            for dealer in &dealers {
                self.probe_dealer(tx, dealer.dealer_id).await?;
            }
        }

        info!(networks = networks.len(), "network replication sweep finished");
        Ok(())
    }

    /// Runs both read-only probes for one dealer, tolerating failures.
    async fn probe_dealer(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        dealer_id: i64,
    ) -> IntegraResult<()> {
        let mut savepoint = tx
            .begin()
            .await
            .map_err(|err| IntegraError::Database(format!("savepoint: {err}")))?;
        match self
            .network
            .replicated_by_dealer(&mut savepoint, dealer_id)
            .await
        {
            Ok(()) => {
                savepoint
                    .commit()
                    .await
                    .map_err(|err| IntegraError::Database(format!("savepoint commit: {err}")))?;
            }
            Err(err) => {
                let _ = savepoint.rollback().await;
                warn!(dealer = dealer_id, error = %err, "replicated-set probe failed");
                return Ok(());
            }
        }

        let mut savepoint = tx
            .begin()
            .await
            .map_err(|err| IntegraError::Database(format!("savepoint: {err}")))?;
        match self.network.candidates(&mut savepoint, dealer_id).await {
            Ok(()) => {
                savepoint
                    .commit()
                    .await
                    .map_err(|err| IntegraError::Database(format!("savepoint commit: {err}")))?;
            }
            Err(err) => {
                let _ = savepoint.rollback().await;
                warn!(dealer = dealer_id, error = %err, "replication-candidate probe failed");
            }
        }
        Ok(())
    }

    /// Moves the five staged domains into their production tables.
    async fn move_staging(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        cutoff: DateTime<Utc>,
    ) -> IntegraResult<()> {
        info!(%cutoff, "staging move started");
        self.integration
            .move_marketing_structure(&mut *tx, cutoff)
            .await?;
        self.integration.move_product(&mut *tx, cutoff).await?;
        self.integration.move_packaging(&mut *tx, cutoff).await?;
        self.integration.move_combo(&mut *tx, cutoff).await?;
        self.integration.move_promotion(&mut *tx, cutoff).await?;
        info!("staging move finished");
        Ok(())
    }
}
