//! The per-agent enforcement pipeline.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use aw_audit::{AuditEvent, AuditEventKind, AuditLog};
use aw_core::{ActionKind, Agent, AgentId, BlockReason, OrderRequest, SpendLimit, Verdict};
use aw_policy::{check_spend_limit, OrderFacts, RuleContext, RulesEngine, SpendTracker};

use crate::client::ExecutionClient;
use crate::error::{WalletError, WalletResult};
use crate::kill_switch::KillSwitch;

/// Outcome of a kill-switch activation.
///
/// The flag takes effect regardless of whether order cancellation
/// succeeded; a cancel failure is recorded here and in the audit trail.
#[derive(Debug, Clone, Serialize)]
pub struct KillSwitchReport {
    pub agent_id: AgentId,
    pub cancelled: Option<Value>,
    pub cancel_error: Option<String>,
}

/// Binds one agent to its spend limit, the shared policy components, and a
/// private kill switch. All of an agent's actions flow through `execute`.
pub struct Wallet {
    agent: RwLock<Agent>,
    spend_limit: RwLock<SpendLimit>,
    kill_switch: KillSwitch,
    global_kill: Arc<KillSwitch>,
    rules: Arc<RulesEngine>,
    spend: Arc<SpendTracker>,
    audit: Arc<AuditLog>,
    client: Arc<dyn ExecutionClient>,
    /// Serializes spend-check → execute → spend-record for this agent, so
    /// two concurrent orders cannot both pass the daily ceiling against
    /// the same stale sum.
    spend_gate: Mutex<()>,
}

impl Wallet {
    #[must_use]
    pub fn new(
        agent: Agent,
        spend_limit: SpendLimit,
        rules: Arc<RulesEngine>,
        spend: Arc<SpendTracker>,
        audit: Arc<AuditLog>,
        global_kill: Arc<KillSwitch>,
        client: Arc<dyn ExecutionClient>,
    ) -> Self {
        Self {
            agent: RwLock::new(agent),
            spend_limit: RwLock::new(spend_limit),
            kill_switch: KillSwitch::new(),
            global_kill,
            rules,
            spend,
            audit,
            client,
            spend_gate: Mutex::new(()),
        }
    }

    /// Snapshot of the agent's registration state.
    #[must_use]
    pub fn agent(&self) -> Agent {
        self.agent.read().clone()
    }

    #[must_use]
    pub fn agent_id(&self) -> AgentId {
        self.agent.read().agent_id
    }

    /// Snapshot of the attached spend limit.
    #[must_use]
    pub fn spend_limit(&self) -> SpendLimit {
        self.spend_limit.read().clone()
    }

    /// Explicitly replace the spend limit (the only way it changes).
    pub fn replace_spend_limit(&self, limit: SpendLimit) {
        *self.spend_limit.write() = limit;
    }

    pub(crate) fn set_active(&self, active: bool) {
        self.agent.write().active = active;
    }

    #[must_use]
    pub fn is_kill_switch_active(&self) -> bool {
        self.kill_switch.is_active() || self.global_kill.is_active()
    }

    /// Run an action through the full enforcement path.
    ///
    /// Exactly one terminal audit event (`action_denied`, `action_executed`
    /// or `action_failed`) follows the initial `action_requested` on every
    /// branch; no branch is silent. A denied or failed action is never
    /// retried here.
    pub fn execute(&self, action: ActionKind, payload: Value) -> WalletResult<Value> {
        let agent = self.agent.read().clone();
        let agent_id = agent.agent_id;

        // Pre-decision record exists even if everything downstream fails.
        self.audit.append(AuditEvent::new(
            agent_id,
            AuditEventKind::ActionRequested,
            Some(action),
            payload.clone(),
        ))?;

        if self.is_kill_switch_active() {
            return self.deny(agent_id, action, &payload, BlockReason::KillSwitch);
        }

        if !agent.active {
            return self.deny(agent_id, action, &payload, BlockReason::AgentInactive);
        }

        let order = match self.order_facts(action, &payload) {
            Ok(order) => order,
            Err(e) => {
                // Malformed payloads still terminate the audit pair.
                self.audit.append(
                    AuditEvent::new(
                        agent_id,
                        AuditEventKind::ActionFailed,
                        Some(action),
                        payload.clone(),
                    )
                    .with_error(e.to_string()),
                )?;
                return Err(e);
            }
        };

        // Orders hold the per-agent critical section from the spend check
        // through spend recording (closes the concurrent-limit race).
        let _gate = order.as_ref().map(|_| self.spend_gate.lock());

        let daily_spend = self.spend.daily_spend(agent_id);
        let weekly_spend = self.spend.weekly_spend(agent_id);
        let ctx = RuleContext {
            action,
            request: payload.clone(),
            agent,
            spend_limit: self.spend_limit.read().clone(),
            daily_spend,
            weekly_spend,
            order,
        };

        // Fixed spend-limit checks run before any rule.
        if let Some(order) = &ctx.order {
            if let Err(reason) =
                check_spend_limit(&ctx.spend_limit, order, daily_spend, weekly_spend)
            {
                return self.deny(agent_id, action, &payload, BlockReason::SpendLimit { reason });
            }
        }

        let (verdict, rule_id) = self
            .rules
            .evaluate(&ctx, &self.audit, agent_id, Utc::now())?;
        match verdict {
            Verdict::Deny => {
                let rule_id = rule_id.unwrap_or_default();
                return self.deny(agent_id, action, &payload, BlockReason::RuleDenied { rule_id });
            }
            Verdict::RequireApproval => {
                let rule_id = rule_id.unwrap_or_default();
                return self.deny(
                    agent_id,
                    action,
                    &payload,
                    BlockReason::RequiresApproval { rule_id },
                );
            }
            Verdict::Allow => {}
        }

        self.audit.append(AuditEvent::new(
            agent_id,
            AuditEventKind::ActionAllowed,
            Some(action),
            payload.clone(),
        ))?;

        match self.client.execute(agent_id, action, &payload) {
            Ok(response) => {
                if let Some(order) = &ctx.order {
                    self.spend.record(agent_id, order.order_value);
                }
                self.audit.append(
                    AuditEvent::new(
                        agent_id,
                        AuditEventKind::ActionExecuted,
                        Some(action),
                        payload,
                    )
                    .with_response(response.clone()),
                )?;
                debug!(agent_id = %agent_id, %action, "Action executed");
                Ok(response)
            }
            Err(e) => {
                self.audit.append(
                    AuditEvent::new(agent_id, AuditEventKind::ActionFailed, Some(action), payload)
                        .with_error(e.to_string()),
                )?;
                Err(WalletError::ExecutionFailed(e))
            }
        }
    }

    /// Derive order facts from the typed payload for `CreateOrder`.
    fn order_facts(&self, action: ActionKind, payload: &Value) -> WalletResult<Option<OrderFacts>> {
        if !action.is_order() {
            return Ok(None);
        }
        let order: OrderRequest = serde_json::from_value(payload.clone())
            .map_err(|e| WalletError::InvalidRequest(e.to_string()))?;
        order
            .validate()
            .map_err(|e| WalletError::InvalidRequest(e.to_string()))?;
        Ok(Some(OrderFacts {
            ticker: order.ticker.clone(),
            order_value: order.value(),
            quantity: order.quantity,
        }))
    }

    fn deny(
        &self,
        agent_id: AgentId,
        action: ActionKind,
        payload: &Value,
        reason: BlockReason,
    ) -> WalletResult<Value> {
        warn!(agent_id = %agent_id, %action, %reason, "Action denied");
        let mut event = AuditEvent::new(
            agent_id,
            AuditEventKind::ActionDenied,
            Some(action),
            payload.clone(),
        )
        .with_error(reason.to_string());
        if let BlockReason::RuleDenied { rule_id } | BlockReason::RequiresApproval { rule_id } =
            &reason
        {
            event = event.with_rule(rule_id.clone());
        }
        self.audit.append(event)?;
        Err(WalletError::ActionBlocked(reason))
    }

    // ── Typed wrappers over the pipeline ───────────────────────────────

    pub fn get_balance(&self) -> WalletResult<Value> {
        self.execute(ActionKind::GetBalance, json!({}))
    }

    pub fn get_positions(&self, limit: usize) -> WalletResult<Value> {
        self.execute(ActionKind::GetPositions, json!({ "limit": limit }))
    }

    pub fn get_markets(&self, status: Option<&str>, limit: usize) -> WalletResult<Value> {
        self.execute(
            ActionKind::GetMarkets,
            json!({ "status": status, "limit": limit }),
        )
    }

    pub fn get_orderbook(&self, ticker: &str, depth: usize) -> WalletResult<Value> {
        self.execute(
            ActionKind::GetOrderbook,
            json!({ "ticker": ticker, "depth": depth }),
        )
    }

    pub fn create_order(&self, order: &OrderRequest) -> WalletResult<Value> {
        let payload =
            serde_json::to_value(order).map_err(|e| WalletError::InvalidRequest(e.to_string()))?;
        self.execute(ActionKind::CreateOrder, payload)
    }

    pub fn cancel_order(&self, order_id: &str) -> WalletResult<Value> {
        self.execute(ActionKind::CancelOrder, json!({ "order_id": order_id }))
    }

    pub fn cancel_all_orders(&self, ticker: Option<&str>) -> WalletResult<Value> {
        self.execute(ActionKind::BatchCancel, json!({ "ticker": ticker }))
    }

    // ── Kill switch ────────────────────────────────────────────────────

    /// Activate this wallet's kill switch.
    ///
    /// The flag is set first; cancellation of outstanding work is
    /// best-effort and its failure neither clears the flag nor suppresses
    /// the audit event.
    pub fn activate_kill_switch(&self, reason: &str) -> WalletResult<KillSwitchReport> {
        let agent_id = self.agent_id();
        self.kill_switch.activate(reason);

        let (cancelled, cancel_error) = match self.client.cancel_all(agent_id) {
            Ok(result) => (Some(result), None),
            Err(e) => {
                warn!(agent_id = %agent_id, error = %e, "Cancel-all failed during kill switch");
                (None, Some(e.to_string()))
            }
        };

        let mut event = AuditEvent::new(
            agent_id,
            AuditEventKind::KillSwitchActivated,
            None,
            json!({ "reason": reason }),
        );
        if let Some(result) = &cancelled {
            event = event.with_response(result.clone());
        }
        if let Some(err) = &cancel_error {
            event = event.with_error(err.clone());
        }
        self.audit.append(event)?;

        Ok(KillSwitchReport {
            agent_id,
            cancelled,
            cancel_error,
        })
    }

    /// Release this wallet's kill switch.
    pub fn deactivate_kill_switch(&self) -> WalletResult<()> {
        let agent_id = self.agent_id();
        self.kill_switch.deactivate();
        self.audit.append(AuditEvent::new(
            agent_id,
            AuditEventKind::KillSwitchDeactivated,
            None,
            json!({}),
        ))?;
        Ok(())
    }
}
