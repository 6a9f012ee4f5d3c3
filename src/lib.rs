pub mod classify;
pub mod clustering;
pub mod config;
pub mod error;
pub mod evaluate;
pub mod event_file;
pub mod forum;
pub mod metrics;
pub mod pipeline;
pub mod schema;
pub mod store;
pub mod text;
pub mod topic;

pub use error::{Error, Result};

use tracing_subscriber::EnvFilter;

/// Logs go to stderr so the report on stdout stays clean. `RUST_LOG` overrides `info`.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
