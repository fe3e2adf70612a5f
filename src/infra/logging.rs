//! Process-wide tracing setup for the binaries.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info,horse_racing_admin=debug";

/// Builds the filter from `RUST_LOG`, falling back to [`DEFAULT_FILTER`], and
/// quietens the chattier dependencies.
fn build_env_filter() -> anyhow::Result<EnvFilter> {
    let base = std::env::var("RUST_LOG")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_FILTER.to_string());

    let mut directives = vec![base];
    for (target, level) in [("sqlx", "warn"), ("hyper", "warn"), ("tower_http", "info")] {
        directives.push(format!("{}={}", target, level));
    }

    let filter_str = directives.join(",");
    EnvFilter::try_new(&filter_str)
        .map_err(|e| anyhow::anyhow!("Invalid tracing filter '{}': {}", filter_str, e))
}

/// Installs the global subscriber. Calling it twice is an error.
pub fn init_logging() -> anyhow::Result<()> {
    let filter = build_env_filter()?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))
}
