//! Domain models shared by handlers and repositories.

pub mod integration;
pub mod log_record;
pub mod network;
pub mod normalization;
pub mod parameter;
pub mod product;
pub mod promotion;

pub use integration::{IntegrationCombo, PurgeMode};
pub use log_record::{LogRecord, QueueMessage};
pub use network::{Dealer, Network};
pub use normalization::{
    DedupeOutcome, NormalizationLog, NormalizationRow, NormalizationSummary, PromotionGroup,
    PromotionItem, PromotionJson,
};
pub use parameter::Parameter;
pub use product::{ProductPayload, ProductRow, ProductSelection};
pub use promotion::{ProcedureResult, PromotionRow};
