//! Action kinds and the typed order payload.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// The kinds of action an agent can request through its wallet.
///
/// Read operations still pass through the full pipeline so that every
/// access leaves an audit trail, but only `CreateOrder` is subject to
/// spend-limit arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    GetBalance,
    GetPositions,
    GetMarkets,
    GetOrderbook,
    CreateOrder,
    CancelOrder,
    BatchCancel,
}

impl ActionKind {
    /// Whether this action creates a new order (and therefore spends).
    #[must_use]
    pub fn is_order(&self) -> bool {
        matches!(self, Self::CreateOrder)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::GetBalance => "get_balance",
            Self::GetPositions => "get_positions",
            Self::GetMarkets => "get_markets",
            Self::GetOrderbook => "get_orderbook",
            Self::CreateOrder => "create_order",
            Self::CancelOrder => "cancel_order",
            Self::BatchCancel => "batch_cancel",
        };
        write!(f, "{s}")
    }
}

/// Side of a binary-market order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderSide {
    Yes,
    No,
}

/// Buy or sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeAction {
    Buy,
    Sell,
}

/// Typed payload for `ActionKind::CreateOrder`.
///
/// The pipeline computes the order's value as `price * quantity`; both are
/// exact decimals to keep spend accounting free of float error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub ticker: String,
    pub side: OrderSide,
    pub action: TradeAction,
    pub quantity: Decimal,
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_order_id: Option<String>,
}

impl OrderRequest {
    /// Notional value the order would spend if filled.
    #[must_use]
    pub fn value(&self) -> Decimal {
        self.price * self.quantity
    }

    /// Validate the numeric fields before the order enters the pipeline.
    pub fn validate(&self) -> CoreResult<()> {
        if self.quantity <= Decimal::ZERO {
            return Err(CoreError::InvalidAmount(format!(
                "order quantity must be positive, got {}",
                self.quantity
            )));
        }
        if self.price <= Decimal::ZERO {
            return Err(CoreError::InvalidAmount(format!(
                "order price must be positive, got {}",
                self.price
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn order(price: Decimal, quantity: Decimal) -> OrderRequest {
        OrderRequest {
            ticker: "FED-25DEC".to_string(),
            side: OrderSide::Yes,
            action: TradeAction::Buy,
            quantity,
            price,
            client_order_id: None,
        }
    }

    #[test]
    fn order_value_is_price_times_quantity() {
        assert_eq!(order(dec!(0.40), dec!(100)).value(), dec!(40.00));
    }

    #[test]
    fn zero_quantity_rejected() {
        assert!(order(dec!(0.40), dec!(0)).validate().is_err());
        assert!(order(dec!(0), dec!(10)).validate().is_err());
        assert!(order(dec!(0.40), dec!(10)).validate().is_ok());
    }

    #[test]
    fn action_kind_roundtrip() {
        let json = serde_json::to_string(&ActionKind::CreateOrder).unwrap();
        assert_eq!(json, "\"create_order\"");
        assert_eq!(ActionKind::CreateOrder.to_string(), "create_order");
        assert!(ActionKind::CreateOrder.is_order());
        assert!(!ActionKind::CancelOrder.is_order());
    }
}
