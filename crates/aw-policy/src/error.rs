//! Policy error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("Invalid condition: {0}")]
    InvalidCondition(String),
}

pub type PolicyResult<T> = Result<T, PolicyError>;
