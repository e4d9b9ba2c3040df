//! Policy outcomes: rule verdicts and denial reasons.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Outcome of rules evaluation for one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Allow,
    Deny,
    RequireApproval,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Allow => "allow",
            Self::Deny => "deny",
            Self::RequireApproval => "require_approval",
        };
        write!(f, "{s}")
    }
}

/// Why the pipeline refused an action.
///
/// Each variant carries enough detail to explain the denial in the audit
/// trail without consulting any other record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockReason {
    /// An agent-level or global kill switch is active.
    KillSwitch,
    /// The agent has been deactivated by an operator.
    AgentInactive,
    /// A fixed spend-limit check failed.
    SpendLimit { reason: String },
    /// A rule returned a deny verdict.
    RuleDenied { rule_id: String },
    /// A rule requires a human decision before execution.
    RequiresApproval { rule_id: String },
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KillSwitch => write!(f, "Kill switch is active"),
            Self::AgentInactive => write!(f, "Agent is deactivated"),
            Self::SpendLimit { reason } => write!(f, "{reason}"),
            Self::RuleDenied { rule_id } => write!(f, "Denied by rule: {rule_id}"),
            Self::RequiresApproval { rule_id } => {
                write!(f, "Requires approval (rule: {rule_id})")
            }
        }
    }
}
