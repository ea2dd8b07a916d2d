//! Integration handlers: one per message kind, plus the composite
//! housekeeping pipeline they share.

pub mod integration_job;
pub mod normalization;
pub mod product_import;
pub mod promotion;

pub use integration_job::IntegrationJobPipeline;
pub use normalization::NormalizationHandler;
pub use product_import::ProductImportHandler;
pub use promotion::PromotionHandler;
