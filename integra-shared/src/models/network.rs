//! Network and dealer entities used by the replication sweep.

use sqlx::FromRow;

/// A replication-enabled network with its principal dealer.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Network {
    pub network_id: i64,
    pub dealer_id: i64,
}

/// A dealer belonging to a network.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Dealer {
    pub dealer_id: i64,
}
