//! Centralized configuration (environment variables + defaults).
//!
//! Call `dotenv::dotenv().ok()` before reading these if a `.env` file should apply.

use anyhow::Context;
use std::str::FromStr;

/// Which [`RacingStore`](crate::storage::RacingStore) implementation to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(anyhow::anyhow!(
                "STORE_BACKEND must be 'postgres' or 'memory', got '{}'",
                other
            )),
        }
    }
}

fn var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match var(name) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{} is invalid ('{}'): {}", name, raw, e)),
        None => Ok(default),
    }
}

/// Database URL must be provided (no default) for safety.
pub fn database_url() -> anyhow::Result<String> {
    var("DATABASE_URL").context("DATABASE_URL must be set")
}

/// Storage backend, `postgres` unless `STORE_BACKEND=memory`.
pub fn store_backend() -> anyhow::Result<StoreBackend> {
    parsed("STORE_BACKEND", StoreBackend::Postgres)
}

pub fn api_bind_addr() -> String {
    var("API_BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string())
}

pub fn db_max_connections() -> anyhow::Result<u32> {
    Ok(parsed("DB_MAX_CONNECTIONS", 5u32)?.max(1))
}

/// How many times an id-allocating operation is attempted before giving up.
pub fn id_allocation_attempts() -> anyhow::Result<u32> {
    Ok(parsed("ID_ALLOCATION_ATTEMPTS", 5u32)?.max(1))
}

/// Whether `api_server` applies pending migrations on startup.
pub fn run_migrations() -> anyhow::Result<bool> {
    match var("RUN_MIGRATIONS") {
        None => Ok(false),
        Some(raw) => match raw.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(anyhow::anyhow!("RUN_MIGRATIONS must be a boolean, got '{}'", raw)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_names_are_case_insensitive() {
        assert_eq!("Memory".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert_eq!(" postgres ".parse::<StoreBackend>().unwrap(), StoreBackend::Postgres);
        assert!("sqlite".parse::<StoreBackend>().is_err());
    }
}
