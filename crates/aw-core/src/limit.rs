//! Fixed per-agent spend ceilings.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

fn default_max_per_order() -> Decimal {
    Decimal::from(50)
}

fn default_max_per_day() -> Decimal {
    Decimal::from(200)
}

fn default_max_per_week() -> Decimal {
    Decimal::from(500)
}

fn default_max_quantity() -> Decimal {
    Decimal::from(100)
}

/// Spend limit configuration attached to one wallet.
///
/// Amounts are USD. A limit set is immutable once attached; operators
/// change it only by explicit replacement through the manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendLimit {
    /// Maximum value of a single order.
    #[serde(default = "default_max_per_order")]
    pub max_per_order: Decimal,
    /// Maximum cumulative value over a rolling 24 hours.
    #[serde(default = "default_max_per_day")]
    pub max_per_day: Decimal,
    /// Maximum cumulative value over a rolling 7 days.
    #[serde(default = "default_max_per_week")]
    pub max_per_week: Decimal,
    /// Maximum quantity per order.
    #[serde(default = "default_max_quantity")]
    pub max_quantity: Decimal,
    /// If set, only these tickers may be traded.
    #[serde(default)]
    pub allowed_tickers: Option<Vec<String>>,
    /// Tickers that may never be traded.
    #[serde(default)]
    pub blocked_tickers: Vec<String>,
}

impl Default for SpendLimit {
    fn default() -> Self {
        Self {
            max_per_order: default_max_per_order(),
            max_per_day: default_max_per_day(),
            max_per_week: default_max_per_week(),
            max_quantity: default_max_quantity(),
            allowed_tickers: None,
            blocked_tickers: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn defaults_match_registration_policy() {
        let limit = SpendLimit::default();
        assert_eq!(limit.max_per_order, dec!(50));
        assert_eq!(limit.max_per_day, dec!(200));
        assert_eq!(limit.max_per_week, dec!(500));
        assert_eq!(limit.max_quantity, dec!(100));
        assert!(limit.allowed_tickers.is_none());
        assert!(limit.blocked_tickers.is_empty());
    }

    #[test]
    fn partial_config_fills_defaults() {
        let limit: SpendLimit = serde_json::from_str(r#"{"max_per_order": "25"}"#).unwrap();
        assert_eq!(limit.max_per_order, dec!(25));
        assert_eq!(limit.max_per_day, dec!(200));
    }
}
