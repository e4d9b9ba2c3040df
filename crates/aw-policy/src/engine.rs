//! The rules engine: ordered, prioritized predicates mapped to verdicts.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use aw_audit::{AuditEvent, AuditEventKind, AuditLog, AuditResult};
use aw_core::{AgentId, Verdict};

use crate::condition::Condition;
use crate::context::RuleContext;

/// A named, prioritized policy rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub rule_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub condition: Condition,
    pub verdict: Verdict,
    /// Higher priority evaluates first.
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Shared rules engine.
///
/// Rules live in insertion order; evaluation sorts a snapshot by priority
/// descending with a stable sort, so equal priorities keep insertion order
/// and the same context always selects the same rule.
pub struct RulesEngine {
    rules: Mutex<Vec<Rule>>,
}

impl RulesEngine {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rules: Mutex::new(Vec::new()),
        }
    }

    /// Insert or replace a rule, keyed by `rule_id`.
    ///
    /// Replacement keeps the rule's original insertion position so that
    /// priority tie-breaks stay deterministic across updates.
    pub fn upsert_rule(&self, rule: Rule) {
        let mut rules = self.rules.lock();
        match rules.iter_mut().find(|r| r.rule_id == rule.rule_id) {
            Some(existing) => *existing = rule,
            None => rules.push(rule),
        }
    }

    /// Remove a rule. Unknown ids are a no-op.
    pub fn remove_rule(&self, rule_id: &str) {
        self.rules.lock().retain(|r| r.rule_id != rule_id);
    }

    /// Snapshot of all rules for the registry interface.
    #[must_use]
    pub fn rules(&self) -> Vec<Rule> {
        self.rules.lock().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.lock().is_empty()
    }

    /// Evaluate all active rules against the context.
    ///
    /// Returns the verdict and id of the first rule whose condition holds,
    /// emitting a `RuleTriggered` audit event as a side effect. A condition
    /// that fails to evaluate is logged and skipped; a broken rule must
    /// never abort the pipeline. No rule firing means `Allow`.
    pub fn evaluate(
        &self,
        ctx: &RuleContext,
        audit: &AuditLog,
        agent_id: AgentId,
        now: DateTime<Utc>,
    ) -> AuditResult<(Verdict, Option<String>)> {
        let mut candidates: Vec<Rule> = {
            let rules = self.rules.lock();
            rules.iter().filter(|r| r.active).cloned().collect()
        };
        // Stable: ties keep insertion order.
        candidates.sort_by_key(|r| std::cmp::Reverse(r.priority));

        for rule in &candidates {
            match rule.condition.evaluate(ctx, now) {
                Ok(true) => {
                    debug!(
                        rule_id = %rule.rule_id,
                        verdict = %rule.verdict,
                        "Rule triggered"
                    );
                    audit.append(
                        AuditEvent::new(
                            agent_id,
                            AuditEventKind::RuleTriggered,
                            Some(ctx.action),
                            ctx.request.clone(),
                        )
                        .with_rule(rule.rule_id.clone())
                        .with_metadata("rule_name", json!(rule.name))
                        .with_metadata("verdict", json!(rule.verdict)),
                    )?;
                    return Ok((rule.verdict, Some(rule.rule_id.clone())));
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(
                        rule_id = %rule.rule_id,
                        error = %e,
                        "Rule evaluation failed, treating as non-firing"
                    );
                }
            }
        }

        Ok((Verdict::Allow, None))
    }
}

impl Default for RulesEngine {
    fn default() -> Self {
        Self::new()
    }
}
