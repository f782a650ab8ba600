//! SQL Console - completion engine library
//! Context-aware SQL completion for the browser query editor

pub mod completion;
pub mod config;
pub mod db;
pub mod error;
pub mod sql;

pub use completion::{CompletionContext, CompletionResult, CompletionService};
pub use config::ConsoleConfig;

use tracing_subscriber::EnvFilter;

/// Default filter when RUST_LOG is not set
const DEFAULT_LOG_FILTER: &str = "sql_console=info";

/// Initialize logging based on RUST_LOG or the given default filter
pub fn init_logging(default_filter: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter.unwrap_or(DEFAULT_LOG_FILTER)));

    // A subscriber may already be installed by the host application
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
