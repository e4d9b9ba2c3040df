//! Fixed spend-limit checks for order creation.

use rust_decimal::Decimal;

use aw_core::SpendLimit;

use crate::context::OrderFacts;

/// Check an order against the agent's fixed ceilings.
///
/// Checks run in a fixed order and the first violation wins: per-order
/// ceiling, daily ceiling, weekly ceiling, max quantity, allow-list,
/// block-list. The returned string is the denial reason recorded in the
/// audit trail.
pub fn check_spend_limit(
    limit: &SpendLimit,
    order: &OrderFacts,
    daily_spend: Decimal,
    weekly_spend: Decimal,
) -> Result<(), String> {
    if order.order_value > limit.max_per_order {
        return Err(format!(
            "Order value {} exceeds max_per_order {}",
            order.order_value, limit.max_per_order
        ));
    }
    if daily_spend + order.order_value > limit.max_per_day {
        return Err(format!(
            "Would exceed daily spend limit of {}",
            limit.max_per_day
        ));
    }
    if weekly_spend + order.order_value > limit.max_per_week {
        return Err(format!(
            "Would exceed weekly spend limit of {}",
            limit.max_per_week
        ));
    }
    if order.quantity > limit.max_quantity {
        return Err(format!(
            "Position size {} exceeds max {}",
            order.quantity, limit.max_quantity
        ));
    }
    if let Some(allowed) = &limit.allowed_tickers {
        if !allowed.iter().any(|t| t == &order.ticker) {
            return Err(format!("Ticker {} not in allowed list", order.ticker));
        }
    }
    if limit.blocked_tickers.iter().any(|t| t == &order.ticker) {
        return Err(format!("Ticker {} is blocked", order.ticker));
    }
    Ok(())
}
