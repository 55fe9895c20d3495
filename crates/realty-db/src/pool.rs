//! Connection pool setup.

use std::time::{Duration, Instant};

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use realty_core::defaults::{DB_ACQUIRE_TIMEOUT_SECS, DB_IDLE_TIMEOUT_SECS, DB_MAX_CONNECTIONS};
use realty_core::{Error, Result};

/// Sizing and timeouts for the property database pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    pub max_connections: u32,
    /// Wait for a free connection; exceeding it surfaces as a 503.
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DB_MAX_CONNECTIONS,
            acquire_timeout: Duration::from_secs(DB_ACQUIRE_TIMEOUT_SECS),
            idle_timeout: Duration::from_secs(DB_IDLE_TIMEOUT_SECS),
        }
    }
}

impl PoolConfig {
    /// Defaults with `DB_MAX_CONNECTIONS` overridden when given.
    pub fn with_max_connections(max_connections: Option<u32>) -> Self {
        let defaults = Self::default();
        Self {
            max_connections: max_connections
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_connections),
            ..defaults
        }
    }
}

/// Open a pool against `database_url`.
pub async fn connect_pool(database_url: &str, config: &PoolConfig) -> Result<PgPool> {
    let start = Instant::now();

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.idle_timeout)
        .connect(database_url)
        .await
        .map_err(Error::Database)?;

    info!(
        subsystem = "database",
        component = "pool",
        op = "connect",
        max_connections = config.max_connections,
        pool_size = pool.size(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Property database pool ready"
    );
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_connections_override() {
        assert_eq!(
            PoolConfig::with_max_connections(Some(4)).max_connections,
            4
        );
        assert_eq!(
            PoolConfig::with_max_connections(None),
            PoolConfig::default()
        );
        // Zero is treated as unset.
        assert_eq!(
            PoolConfig::with_max_connections(Some(0)).max_connections,
            DB_MAX_CONNECTIONS
        );
    }

    #[test]
    fn test_acquire_timeout_default() {
        assert_eq!(
            PoolConfig::default().acquire_timeout,
            Duration::from_secs(30)
        );
    }
}
