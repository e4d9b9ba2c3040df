//! Wallet error types.

use thiserror::Error;

use aw_audit::AuditError;
use aw_core::{BlockReason, RequestId};

use crate::approval::ApprovalStatus;
use crate::client::ExecutionError;

#[derive(Debug, Error)]
pub enum WalletError {
    /// A control check refused the action. Terminal for this call; denied
    /// actions are never retried automatically.
    #[error("Action blocked: {0}")]
    ActionBlocked(BlockReason),

    #[error("{what} not found: {id}")]
    NotFound { what: &'static str, id: String },

    #[error("Approval request {request_id} already resolved ({status:?})")]
    AlreadyResolved {
        request_id: RequestId,
        status: ApprovalStatus,
    },

    /// The opaque external call failed. Wrapped, not swallowed.
    #[error("Execution failed: {0}")]
    ExecutionFailed(#[from] ExecutionError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A lost audit write is a missing compliance record, so it is fatal
    /// to the call instead of being swallowed.
    #[error("Audit log write failed: {0}")]
    Audit(#[from] AuditError),
}

pub type WalletResult<T> = Result<T, WalletError>;

impl WalletError {
    /// The denial detail, when this error is a control-check block.
    #[must_use]
    pub fn block_reason(&self) -> Option<&BlockReason> {
        match self {
            Self::ActionBlocked(reason) => Some(reason),
            _ => None,
        }
    }
}
