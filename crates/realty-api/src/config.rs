//! Server configuration from environment variables.

use axum::http::HeaderValue;
use tracing::warn;

use realty_core::defaults::{DATABASE_URL, MAX_UPLOAD_BYTES, SERVER_HOST, SERVER_PORT};
use realty_core::{Error, Result};
use realty_db::PoolConfig;

/// Listener, database and middleware settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub db_max_connections: Option<u32>,
    /// Allowed CORS origins; empty means any origin (development).
    pub allowed_origins: Vec<HeaderValue>,
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    /// Read `HOST`, `PORT`, `DATABASE_URL`, `DB_MAX_CONNECTIONS`,
    /// `ALLOWED_ORIGINS` and `MAX_UPLOAD_BYTES`.
    pub fn from_env() -> Result<Self> {
        let port = match std::env::var("PORT") {
            Ok(v) => v
                .trim()
                .parse::<u16>()
                .map_err(|_| Error::Config(format!("Invalid PORT '{}'", v)))?,
            Err(_) => SERVER_PORT,
        };
        let db_max_connections = match std::env::var("DB_MAX_CONNECTIONS") {
            Ok(v) => Some(
                v.trim()
                    .parse::<u32>()
                    .map_err(|_| Error::Config(format!("Invalid DB_MAX_CONNECTIONS '{}'", v)))?,
            ),
            Err(_) => None,
        };
        let max_upload_bytes = std::env::var("MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(MAX_UPLOAD_BYTES);

        Ok(Self {
            host: std::env::var("HOST").unwrap_or_else(|_| SERVER_HOST.to_string()),
            port,
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| DATABASE_URL.to_string()),
            db_max_connections,
            allowed_origins: parse_allowed_origins(
                &std::env::var("ALLOWED_ORIGINS").unwrap_or_default(),
            ),
            max_upload_bytes,
        })
    }

    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig::with_max_connections(self.db_max_connections)
    }
}

/// Parse a comma-separated origin list, dropping invalid entries.
pub fn parse_allowed_origins(origins: &str) -> Vec<HeaderValue> {
    origins
        .split(',')
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!("Invalid CORS origin '{}': {}", trimmed, e);
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_allowed_origins() {
        let origins = parse_allowed_origins("https://rent.example.com, http://localhost:3000 ,");
        assert_eq!(origins.len(), 2);
        assert_eq!(origins[0], "https://rent.example.com");
        assert_eq!(origins[1], "http://localhost:3000");

        assert!(parse_allowed_origins("").is_empty());
        assert!(parse_allowed_origins("https://ok.example.com,bad\norigin").len() == 1);
    }
}
