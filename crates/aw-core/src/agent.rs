//! Agent identity and registration state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::id::AgentId;

/// An autonomous caller whose actions are subject to policy control.
///
/// Agents are created on registration and never deleted; the audit trail
/// requires their identity to remain resolvable forever. Operators toggle
/// `active` to revoke or restore access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub agent_id: AgentId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub active: bool,
}

impl Agent {
    /// Register a new active agent.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            agent_id: AgentId::new(),
            name: name.into(),
            description: description.into(),
            created_at: Utc::now(),
            metadata: Map::new(),
            active: true,
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }
}
