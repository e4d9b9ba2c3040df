//! Audit error types.
//!
//! A failed audit write means the compliance record is incomplete, so it
//! surfaces as an error to the caller instead of being swallowed.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type AuditResult<T> = Result<T, AuditError>;
