//! The audit event model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use aw_core::{ActionKind, AgentId, EventId};

/// Kind of audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventKind {
    ActionRequested,
    ActionAllowed,
    ActionDenied,
    ActionExecuted,
    ActionFailed,
    RuleTriggered,
    KillSwitchActivated,
    KillSwitchDeactivated,
}

/// One immutable audit record.
///
/// Events are never mutated or deleted after creation; this is the
/// compliance invariant the whole design protects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_id: EventId,
    pub timestamp: DateTime<Utc>,
    pub agent_id: AgentId,
    pub kind: AuditEventKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<ActionKind>,
    pub request: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl AuditEvent {
    /// Create an event with a fresh id and the current timestamp.
    #[must_use]
    pub fn new(
        agent_id: AgentId,
        kind: AuditEventKind,
        action: Option<ActionKind>,
        request: Value,
    ) -> Self {
        Self {
            event_id: EventId::new(),
            timestamp: Utc::now(),
            agent_id,
            kind,
            action,
            request,
            response: None,
            rule_id: None,
            error: None,
            metadata: Map::new(),
        }
    }

    #[must_use]
    pub fn with_response(mut self, response: Value) -> Self {
        self.response = Some(response);
        self
    }

    #[must_use]
    pub fn with_rule(mut self, rule_id: impl Into<String>) -> Self {
        self.rule_id = Some(rule_id.into());
        self
    }

    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }
}
