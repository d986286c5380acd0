pub mod config;
pub mod engine;
pub mod models;

use tracing_subscriber::EnvFilter;

/// Initialize tracing for binaries. Respects `RUST_LOG`, defaults to
/// info-level output for this crate.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lablens=info")),
        )
        .init();
}
