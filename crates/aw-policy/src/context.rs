//! The evaluation context handed to spend-limit checks and rules.

use rust_decimal::Decimal;
use serde_json::Value;

use aw_core::{ActionKind, Agent, SpendLimit};

/// Facts derived from an order-creation payload.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderFacts {
    pub ticker: String,
    /// `price * quantity`.
    pub order_value: Decimal,
    pub quantity: Decimal,
}

/// Snapshot of everything a rule predicate may inspect.
///
/// Built once per pipeline call; rules see a consistent view even while
/// other agents mutate the shared trackers.
#[derive(Debug, Clone)]
pub struct RuleContext {
    pub action: ActionKind,
    pub request: Value,
    pub agent: Agent,
    pub spend_limit: SpendLimit,
    pub daily_spend: Decimal,
    pub weekly_spend: Decimal,
    /// Present only for `ActionKind::CreateOrder`.
    pub order: Option<OrderFacts>,
}

impl RuleContext {
    /// Order value, or zero for non-order actions.
    ///
    /// Value-threshold conditions treat "not an order" as "spends nothing",
    /// so they never fire on reads or cancels.
    #[must_use]
    pub fn order_value(&self) -> Decimal {
        self.order
            .as_ref()
            .map(|o| o.order_value)
            .unwrap_or(Decimal::ZERO)
    }

    #[must_use]
    pub fn quantity(&self) -> Decimal {
        self.order
            .as_ref()
            .map(|o| o.quantity)
            .unwrap_or(Decimal::ZERO)
    }

    #[must_use]
    pub fn ticker(&self) -> Option<&str> {
        self.order.as_ref().map(|o| o.ticker.as_str())
    }
}
