//! Serializable error payload for the HTTP layer sitting on top of the core.
//!
//! The core does not route requests; it only fixes how its errors are
//! presented: a stable `status` name, a generic `reason`, the error message
//! and a local timestamp. Storage failures keep their detail (SQL text,
//! driver codes) out of the payload.

use crate::service::compilation_service::CompilationError;
use chrono::{Local, NaiveDateTime};
use serde::Serialize;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const STORAGE_FAILURE_MESSAGE: &str = "Internal storage error";

/// Error body returned to API clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiError {
    pub message: String,
    pub reason: String,
    pub status: String,
    /// `yyyy-MM-dd HH:mm:ss`, local time.
    pub timestamp: String,
}

impl ApiError {
    /// Builds the payload for `err`, stamped with the current local time.
    pub fn from_error(err: &CompilationError) -> Self {
        Self::at(err, Local::now().naive_local())
    }

    /// Builds the payload for `err`, stamped with `at`.
    pub fn at(err: &CompilationError, at: NaiveDateTime) -> Self {
        let (status, reason, message) = match err {
            CompilationError::NotFound(_) => (
                "NOT_FOUND",
                "The required object was not found.",
                err.to_string(),
            ),
            CompilationError::ConstraintViolation(_) => (
                "CONFLICT",
                "Integrity constraint has been violated.",
                err.to_string(),
            ),
            CompilationError::Store(_) | CompilationError::Lookup(_) => (
                "INTERNAL_SERVER_ERROR",
                "Unexpected storage failure.",
                STORAGE_FAILURE_MESSAGE.to_string(),
            ),
        };

        Self {
            message,
            reason: reason.to_string(),
            status: status.to_string(),
            timestamp: at.format(TIMESTAMP_FORMAT).to_string(),
        }
    }

    /// Numeric HTTP status matching `status`.
    pub fn http_status(&self) -> u16 {
        match self.status.as_str() {
            "NOT_FOUND" => 404,
            "CONFLICT" => 409,
            "BAD_REQUEST" => 400,
            _ => 500,
        }
    }
}

impl From<&CompilationError> for ApiError {
    fn from(value: &CompilationError) -> Self {
        Self::from_error(value)
    }
}
