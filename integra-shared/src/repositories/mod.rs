//! Repository layer over the relational database.
//!
//! Every aggregate is a trait seam with a Postgres implementation.
//! Pool-scoped repositories (`parameter`, `promotion`) run each operation
//! on its own connection with the standard 30 s timeout. The cleanup and
//! replication repositories take an explicit connection so their operations
//! compose under the pipeline transaction. The product-import and
//! normalization repositories hand out sweep objects that own their
//! transaction: one per pass, committed only when the sweep succeeds.

pub mod integration;
pub mod network;
pub mod normalization;
pub mod parameter;
pub mod product;
pub mod promotion;

pub use integration::{IntegrationRepository, PgIntegrationRepository};
pub use network::{NetworkRepository, PgNetworkRepository};
pub use normalization::{NormalizationRepository, NormalizationSweep, PgNormalizationRepository};
pub use parameter::{ParameterRepository, PgParameterRepository};
pub use product::{PgProductImportRepository, ProductImportRepository, ProductImportSweep};
pub use promotion::{PgPromotionRepository, PromotionRepository};
