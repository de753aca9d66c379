//! Utilities shared by Carve tests.
//!
//! Fixture trees are written as s-expressions (see [`parse_fixture`]) and
//! semantic facts are assembled with [`FactsBuilder`]. Set `RUST_LOG` and call
//! [`init_tracing`] to see the analysis logs while a test runs.

mod facts;
mod fixture;

use std::sync::Once;

use tracing_subscriber::EnvFilter;

pub use facts::{flow, FactsBuilder};
pub use fixture::{parse_fixture, Fixture};

static TRACING_INIT: Once = Once::new();

/// Installs a test-writer `fmt` subscriber filtered by `RUST_LOG` (default
/// `warn`). Safe to call from every test.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}
