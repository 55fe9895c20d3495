//! HTTP error taxonomy.
//!
//! Every handler returns `Result<_, ApiError>`. Library errors are mapped to a
//! stable set of status codes; database errors are classified by SQLSTATE so
//! clients see 409/404/400/503 instead of a bare 500 where the cause is known.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use tracing::{error, warn};

/// Error returned by API handlers.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    /// Database failure classified by [`classify_database_error`].
    Database {
        status: StatusCode,
        message: &'static str,
        details: String,
        code: Option<String>,
    },
    /// Upstream dependency (geocoder, object storage) or internal failure.
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'a str>,
}

const CONNECTION_ERROR_DETAILS: &str = "The server is having trouble connecting to the database";

/// Status and client-facing message for a PostgreSQL SQLSTATE.
pub fn classify_sqlstate(code: Option<&str>) -> (StatusCode, &'static str) {
    match code {
        Some("23505") => (
            StatusCode::CONFLICT,
            "A record with this information already exists",
        ),
        Some("23503") => (StatusCode::BAD_REQUEST, "Invalid relation"),
        Some("22P02") | Some("22003") | Some("23502") | Some("23514") => {
            (StatusCode::BAD_REQUEST, "Invalid data provided")
        }
        // Class 08: connection exception
        Some(c) if c.starts_with("08") => {
            (StatusCode::SERVICE_UNAVAILABLE, "Database connection error")
        }
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "Database error"),
    }
}

/// Classify a sqlx error into an [`ApiError::Database`].
pub fn classify_database_error(err: &sqlx::Error) -> ApiError {
    match err {
        sqlx::Error::RowNotFound => ApiError::Database {
            status: StatusCode::NOT_FOUND,
            message: "Record not found",
            details: err.to_string(),
            code: None,
        },
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Configuration(_) => ApiError::Database {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: "Database connection error",
            details: CONNECTION_ERROR_DETAILS.to_string(),
            code: None,
        },
        sqlx::Error::Database(db_err) => {
            let code = db_err.code().map(|c| c.into_owned());
            let (status, message) = classify_sqlstate(code.as_deref());
            ApiError::Database {
                status,
                message,
                details: db_err.message().to_string(),
                // Only unclassified failures expose the raw SQLSTATE.
                code: if status == StatusCode::INTERNAL_SERVER_ERROR {
                    code
                } else {
                    None
                },
            }
        }
        other => ApiError::Database {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Database error",
            details: other.to_string(),
            code: None,
        },
    }
}

impl From<realty_core::Error> for ApiError {
    fn from(err: realty_core::Error) -> Self {
        use realty_core::Error;
        match err {
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::DeleteBlocked(msg) => ApiError::BadRequest(msg),
            Error::Unauthorized(msg) => ApiError::Unauthorized(msg),
            Error::Forbidden(msg) => ApiError::Forbidden(msg),
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::Database(db_err) => classify_database_error(&db_err),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Database { status, .. } => *status,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let body = match &self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg) => ErrorBody {
                error: msg,
                details: None,
                code: None,
            },
            ApiError::Database {
                message,
                details,
                code,
                ..
            } => {
                if status.is_server_error() {
                    error!(
                        subsystem = "api",
                        status = status.as_u16(),
                        code = code.as_deref().unwrap_or(""),
                        details = %details,
                        "Database error"
                    );
                } else {
                    warn!(subsystem = "api", status = status.as_u16(), details = %details, "Database request rejected");
                }
                ErrorBody {
                    error: message,
                    details: Some(details),
                    code: code.as_deref(),
                }
            }
            ApiError::Internal(msg) => {
                error!(subsystem = "api", error = %msg, "Request failed");
                ErrorBody {
                    error: "An unexpected error occurred",
                    details: Some(msg),
                    code: None,
                }
            }
        };

        (status, Json(body)).into_response()
    }
}
