//! Logging setup
//!
//! Progress and per-file outcomes go through `tracing` to stderr, leaving
//! stdout for command output (`sites --json`, summaries).

use tracing_subscriber::EnvFilter;

/// Targets of the workspace crates that log.
const DEFAULT_FILTER: &str = "docsmith=info,docsmith_docstring=info,docsmith_llm=info";
const VERBOSE_FILTER: &str = "docsmith=debug,docsmith_docstring=debug,docsmith_llm=debug";

/// Install the global subscriber. `RUST_LOG` wins unless `verbose` is set.
pub fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
