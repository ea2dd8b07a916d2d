//! # Integra Shared
//!
//! Shared foundation for the RMS integration worker: configuration, error
//! types, broker client and message envelopes, domain models and the
//! repository layer over the relational database.
//!
//! The worker binary lives in `integra-worker`; everything here is the
//! plumbing both the worker and the operator tooling (sender CLI, health
//! endpoint) build on.

pub mod config;
pub mod constants;
pub mod database;
pub mod errors;
pub mod logging;
pub mod messaging;
pub mod models;
pub mod repositories;

pub use errors::{IntegraError, IntegraResult};
