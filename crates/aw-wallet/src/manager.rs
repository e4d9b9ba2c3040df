//! The wallet manager: entity registry and composition root.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde_json::{json, Map, Value};
use tracing::{error, info};

use aw_audit::{AuditEvent, AuditEventKind, AuditLog, AuditQuery};
use aw_core::{
    ActionKind, Agent, AgentId, BlockReason, OrderRequest, RequestId, SpendLimit, Verdict,
};
use aw_policy::{Condition, Rule, RulesEngine, SpendTracker};

use crate::approval::{ApprovalQueue, PendingApproval};
use crate::client::ExecutionClient;
use crate::config::WalletConfig;
use crate::error::{WalletError, WalletResult};
use crate::kill_switch::KillSwitch;
use crate::wallet::{KillSwitchReport, Wallet};

/// What happened to an action submitted through the manager.
#[derive(Debug, Clone)]
pub enum ActionOutcome {
    /// The pipeline allowed the action and it ran.
    Executed(Value),
    /// A rule withheld the action; a pending approval was filed.
    HeldForApproval {
        request_id: RequestId,
        rule_id: String,
    },
}

/// Owns the shared policy components and one wallet per agent.
///
/// Created at startup and passed by reference into callers; there is no
/// ambient module-level state.
pub struct WalletManager {
    client: Arc<dyn ExecutionClient>,
    audit: Arc<AuditLog>,
    rules: Arc<RulesEngine>,
    spend: Arc<SpendTracker>,
    approvals: ApprovalQueue,
    global_kill: Arc<KillSwitch>,
    wallets: RwLock<HashMap<AgentId, Arc<Wallet>>>,
    default_spend_limit: SpendLimit,
}

impl WalletManager {
    pub fn new(client: Arc<dyn ExecutionClient>, config: WalletConfig) -> WalletResult<Self> {
        let audit = Arc::new(AuditLog::open(&config.audit_log_path)?);
        let rules = Arc::new(RulesEngine::new());
        if config.install_default_rules {
            install_default_rules(&rules);
        }
        Ok(Self {
            client,
            audit,
            rules,
            spend: Arc::new(SpendTracker::new()),
            approvals: ApprovalQueue::new(),
            global_kill: Arc::new(KillSwitch::new()),
            wallets: RwLock::new(HashMap::new()),
            default_spend_limit: config.default_spend_limit,
        })
    }

    // ── Agent registry ─────────────────────────────────────────────────

    /// Register an agent and bind its wallet.
    pub fn create_agent(
        &self,
        name: &str,
        description: &str,
        spend_limit: Option<SpendLimit>,
        metadata: Map<String, Value>,
    ) -> Agent {
        let agent = Agent::new(name, description).with_metadata(metadata);
        let wallet = Arc::new(Wallet::new(
            agent.clone(),
            spend_limit.unwrap_or_else(|| self.default_spend_limit.clone()),
            Arc::clone(&self.rules),
            Arc::clone(&self.spend),
            Arc::clone(&self.audit),
            Arc::clone(&self.global_kill),
            Arc::clone(&self.client),
        ));
        self.wallets.write().insert(agent.agent_id, wallet);
        info!(agent_id = %agent.agent_id, name, "Agent registered");
        agent
    }

    /// Look up an agent's wallet.
    pub fn wallet(&self, agent_id: AgentId) -> WalletResult<Arc<Wallet>> {
        self.wallets
            .read()
            .get(&agent_id)
            .cloned()
            .ok_or_else(|| WalletError::NotFound {
                what: "agent",
                id: agent_id.to_string(),
            })
    }

    /// Snapshot of all registered agents.
    #[must_use]
    pub fn agents(&self) -> Vec<Agent> {
        self.wallets.read().values().map(|w| w.agent()).collect()
    }

    /// Revoke an agent's access. Agents are never deleted; the audit
    /// trail requires their identity to stay resolvable.
    pub fn deactivate_agent(&self, agent_id: AgentId) -> WalletResult<()> {
        self.wallet(agent_id)?.set_active(false);
        info!(agent_id = %agent_id, "Agent deactivated");
        Ok(())
    }

    /// Restore a deactivated agent.
    pub fn activate_agent(&self, agent_id: AgentId) -> WalletResult<()> {
        self.wallet(agent_id)?.set_active(true);
        info!(agent_id = %agent_id, "Agent reactivated");
        Ok(())
    }

    /// Explicitly replace an agent's spend limit.
    pub fn replace_spend_limit(&self, agent_id: AgentId, limit: SpendLimit) -> WalletResult<()> {
        self.wallet(agent_id)?.replace_spend_limit(limit);
        Ok(())
    }

    // ── Action entry point ─────────────────────────────────────────────

    /// Run an action through the agent's pipeline, filing a pending
    /// approval when a rule withholds it.
    pub fn execute(
        &self,
        agent_id: AgentId,
        action: ActionKind,
        payload: Value,
    ) -> WalletResult<ActionOutcome> {
        let wallet = self.wallet(agent_id)?;
        match wallet.execute(action, payload.clone()) {
            Ok(response) => Ok(ActionOutcome::Executed(response)),
            Err(WalletError::ActionBlocked(BlockReason::RequiresApproval { rule_id })) => {
                let reason = BlockReason::RequiresApproval {
                    rule_id: rule_id.clone(),
                }
                .to_string();
                let request_id = self.approvals.create(agent_id, action, payload, reason);
                Ok(ActionOutcome::HeldForApproval {
                    request_id,
                    rule_id,
                })
            }
            Err(e) => Err(e),
        }
    }

    pub fn create_order(
        &self,
        agent_id: AgentId,
        order: &OrderRequest,
    ) -> WalletResult<ActionOutcome> {
        let payload =
            serde_json::to_value(order).map_err(|e| WalletError::InvalidRequest(e.to_string()))?;
        self.execute(agent_id, ActionKind::CreateOrder, payload)
    }

    // ── Rules ──────────────────────────────────────────────────────────

    pub fn upsert_rule(&self, rule: Rule) {
        self.rules.upsert_rule(rule);
    }

    pub fn remove_rule(&self, rule_id: &str) {
        self.rules.remove_rule(rule_id);
    }

    #[must_use]
    pub fn rules(&self) -> Vec<Rule> {
        self.rules.rules()
    }

    // ── Kill switch ────────────────────────────────────────────────────

    /// Emergency-stop every wallet.
    ///
    /// Sets the global flag first so queued actions stop immediately, then
    /// cancels outstanding work per agent. One agent's failure (cancel or
    /// audit) does not stop processing of the rest; the first audit error
    /// is surfaced after all wallets are handled.
    pub fn global_kill_switch(&self, reason: &str) -> WalletResult<Vec<KillSwitchReport>> {
        self.global_kill.activate(reason);

        let wallets: Vec<Arc<Wallet>> = self.wallets.read().values().cloned().collect();
        let mut reports = Vec::with_capacity(wallets.len());
        let mut first_error = None;
        for wallet in wallets {
            match wallet.activate_kill_switch(reason) {
                Ok(report) => reports.push(report),
                Err(e) => {
                    error!(agent_id = %wallet.agent_id(), error = %e, "Kill switch audit write failed");
                    first_error.get_or_insert(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(reports),
        }
    }

    /// Release the global flag. Per-agent switches set during the global
    /// stop stay latched until released individually. The release itself
    /// is recorded as a control-plane audit event.
    pub fn release_global_kill_switch(&self) -> WalletResult<()> {
        self.global_kill.deactivate();
        self.audit.append(
            AuditEvent::new(
                AgentId::control_plane(),
                AuditEventKind::KillSwitchDeactivated,
                None,
                json!({}),
            )
            .with_metadata("scope", json!("global")),
        )?;
        Ok(())
    }

    #[must_use]
    pub fn is_global_kill_switch_active(&self) -> bool {
        self.global_kill.is_active()
    }

    // ── Audit & approvals ──────────────────────────────────────────────

    #[must_use]
    pub fn audit_events(&self, query: &AuditQuery) -> Vec<aw_audit::AuditEvent> {
        self.audit.events(query)
    }

    #[must_use]
    pub fn audit_log(&self) -> &AuditLog {
        &self.audit
    }

    #[must_use]
    pub fn pending_approvals(&self) -> Vec<PendingApproval> {
        self.approvals.pending()
    }

    #[must_use]
    pub fn approval(&self, request_id: RequestId) -> Option<PendingApproval> {
        self.approvals.get(request_id)
    }

    /// Resolve a held action. Approval executes it directly through the
    /// execution client; automated policy is not re-run.
    pub fn resolve_approval(
        &self,
        request_id: RequestId,
        approved: bool,
        approver: &str,
    ) -> WalletResult<PendingApproval> {
        self.approvals
            .resolve(request_id, approved, approver, &*self.client, &self.audit)
    }
}

/// Built-in safety rules installed at startup.
fn install_default_rules(rules: &RulesEngine) {
    rules.upsert_rule(Rule {
        rule_id: "default_max_order_value".to_string(),
        name: "Maximum Order Value".to_string(),
        description: "Block orders over $100".to_string(),
        condition: Condition::MaxOrderValue {
            threshold: Decimal::from(100),
        },
        verdict: Verdict::Deny,
        priority: 100,
        active: true,
    });
    rules.upsert_rule(Rule {
        rule_id: "default_approval_threshold".to_string(),
        name: "Approval Threshold".to_string(),
        description: "Require approval for orders over $50".to_string(),
        condition: Condition::MaxOrderValue {
            threshold: Decimal::from(50),
        },
        verdict: Verdict::RequireApproval,
        priority: 50,
        active: true,
    });
}
