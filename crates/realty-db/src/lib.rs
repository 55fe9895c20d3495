//! # realty-db
//!
//! PostgreSQL + PostGIS database layer for the realty property service.
//!
//! This crate provides:
//! - Connection pool management
//! - The property search predicate builder
//! - The property repository (search, create/update, status, images, leases)
//!
//! ## Example
//!
//! ```rust,ignore
//! use realty_db::{Database, PoolConfig, PropertyRepository, PropertySearchFilter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/realty", &PoolConfig::default()).await?;
//!     let filter = PropertySearchFilter::new().near(40.0, -75.0);
//!     let properties = db.properties.search(&filter).await?;
//!     println!("{} properties nearby", properties.len());
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

pub mod pool;
pub mod properties;
pub mod property_filter;

// Test fixtures for integration tests (always compiled so tests/ can use them)
pub mod test_fixtures;

// Re-export core types
pub use realty_core::*;

pub use pool::{connect_pool, PoolConfig};
pub use properties::{parse_wkt_point, PgPropertyRepository};
pub use property_filter::{PropertyFilterQueryBuilder, PropertyFilterResult, QueryParam};

/// Data-access context: the pool plus the repository built on it.
///
/// `properties` is shared so the HTTP layer can hold it as a trait object.
#[derive(Clone)]
pub struct Database {
    pub pool: sqlx::Pool<sqlx::Postgres>,
    pub properties: Arc<PgPropertyRepository>,
}

impl Database {
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            properties: Arc::new(PgPropertyRepository::new(pool.clone())),
            pool,
        }
    }

    /// Connect with the given pool settings.
    pub async fn connect(url: &str, config: &PoolConfig) -> Result<Self> {
        let pool = connect_pool(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Close the pool, waiting for checked-out connections to be returned.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
