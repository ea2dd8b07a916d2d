//! Console logging bootstrap using the tracing ecosystem.
//!
//! Container-friendly: everything goes to stdout, colors only on a TTY,
//! level controlled via `RUST_LOG` (default `info`).

use std::io::IsTerminal;
use std::sync::OnceLock;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: OnceLock<()> = OnceLock::new();

/// Initializes the global subscriber. Safe to call more than once; later
/// calls are no-ops, which keeps test binaries from panicking.
pub fn init_tracing() {
    INIT.get_or_init(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let fmt_layer = fmt::layer()
            .with_target(true)
            .with_ansi(std::io::stdout().is_terminal());

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    });
}
