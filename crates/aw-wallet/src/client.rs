//! The execution capability consumed from collaborators.

use serde_json::Value;
use thiserror::Error;

use aw_core::{ActionKind, AgentId};

/// Failure of the opaque external call.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ExecutionError {
    pub message: String,
}

impl ExecutionError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// An opaque capability that fulfils an authorized action.
///
/// The pipeline treats `execute` as a single bounded blocking call with a
/// structured success result or a failure; there is no retry and no
/// partial result. `cancel_all` is used only by the kill switch.
pub trait ExecutionClient: Send + Sync {
    /// Execute a concrete action for an agent.
    fn execute(
        &self,
        agent_id: AgentId,
        action: ActionKind,
        payload: &Value,
    ) -> Result<Value, ExecutionError>;

    /// Cancel all outstanding actions for an agent.
    fn cancel_all(&self, agent_id: AgentId) -> Result<Value, ExecutionError>;
}
