//! Serializable rule conditions.
//!
//! Conditions are a tagged enum rather than closures so that rules can be
//! persisted, inspected, and listed over the registry interface.

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::context::RuleContext;
use crate::error::{PolicyError, PolicyResult};

/// A pure predicate over the evaluation context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    /// Fires when the order value exceeds `threshold` (USD).
    MaxOrderValue { threshold: Decimal },
    /// Fires when the order's ticker is in `tickers`.
    TickerBlock { tickers: Vec<String> },
    /// Fires during `[start_hour, end_hour)` UTC. Wraps past midnight when
    /// `start_hour > end_hour`, e.g. 23..1.
    TimeWindow { start_hour: u32, end_hour: u32 },
    /// Fires on Saturday and Sunday (UTC).
    WeekendBlock,
    /// Fires when the order quantity exceeds `max_quantity`.
    PositionSize { max_quantity: Decimal },
    /// Fires when the agent's trailing-24h spend exceeds `threshold` (USD).
    DailySpendAbove { threshold: Decimal },
}

impl Condition {
    /// Evaluate against a context at time `now`.
    ///
    /// An invalid configuration is an error, not a panic; the engine treats
    /// it as non-firing and keeps the pipeline alive.
    pub fn evaluate(&self, ctx: &RuleContext, now: DateTime<Utc>) -> PolicyResult<bool> {
        match self {
            Self::MaxOrderValue { threshold } => Ok(ctx.order_value() > *threshold),
            Self::TickerBlock { tickers } => Ok(ctx
                .ticker()
                .map(|t| tickers.iter().any(|b| b == t))
                .unwrap_or(false)),
            Self::TimeWindow {
                start_hour,
                end_hour,
            } => {
                if *start_hour > 23 || *end_hour > 23 {
                    return Err(PolicyError::InvalidCondition(format!(
                        "time_window hours must be 0..=23, got {start_hour}..{end_hour}"
                    )));
                }
                let hour = now.hour();
                Ok(if start_hour <= end_hour {
                    hour >= *start_hour && hour < *end_hour
                } else {
                    hour >= *start_hour || hour < *end_hour
                })
            }
            Self::WeekendBlock => Ok(matches!(now.weekday(), Weekday::Sat | Weekday::Sun)),
            Self::PositionSize { max_quantity } => Ok(ctx.quantity() > *max_quantity),
            Self::DailySpendAbove { threshold } => Ok(ctx.daily_spend > *threshold),
        }
    }
}
