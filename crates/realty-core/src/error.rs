//! Error types for the realty service.

use thiserror::Error;

/// Result type alias using realty's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for realty operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found (or not visible to the caller)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Deletion refused because dependent records are still active
    #[error("Delete blocked: {0}")]
    DeleteBlocked(String),

    /// Authentication failed or missing
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Forbidden (authenticated but not authorized)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Geocoding lookup failed (network, timeout, bad response)
    #[error("Geocoding error: {0}")]
    Geocoding(String),

    /// Object storage operation failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("Property 7".to_string());
        assert_eq!(err.to_string(), "Not found: Property 7");
    }

    #[test]
    fn test_error_display_delete_blocked() {
        let err = Error::DeleteBlocked("active leases".to_string());
        assert_eq!(err.to_string(), "Delete blocked: active leases");
    }

    #[test]
    fn test_error_display_geocoding() {
        let err = Error::Geocoding("timeout".to_string());
        assert_eq!(err.to_string(), "Geocoding error: timeout");
    }

    #[test]
    fn test_error_display_storage() {
        let err = Error::Storage("bucket missing".to_string());
        assert_eq!(err.to_string(), "Storage error: bucket missing");
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Serialization(msg) if !msg.is_empty()));
    }

    #[test]
    fn test_from_sqlx_error() {
        let err: Error = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, Error::Database(sqlx::Error::RowNotFound)));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("access denied"));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
