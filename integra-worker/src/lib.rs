//! # Integra Worker
//!
//! The long-running integration worker: consumes `integracaoCron`,
//! dispatches each message to one of the integration handlers and
//! coordinates downstream work against the database and the `log` queue.

pub mod dispatcher;
pub mod handlers;
pub mod health;
pub mod listener;

pub use dispatcher::Dispatcher;
pub use listener::Listener;
