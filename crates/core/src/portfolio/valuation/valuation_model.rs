use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::portfolio::positions::Position;

/// A position joined with its live quote.
///
/// Market fields stay `None` when the position is closed or no quote could
/// be fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuedPosition {
    #[serde(flatten)]
    pub position: Position,
    pub market_price: Option<Decimal>,
    pub market_value: Option<Decimal>,
    pub market_value_base: Option<Decimal>,
    pub unrealized_pnl: Option<Decimal>,
    pub unrealized_pnl_base: Option<Decimal>,
    pub day_change: Option<Decimal>,
    pub day_change_base: Option<Decimal>,
    pub quote_error: Option<String>,
}

impl ValuedPosition {
    pub fn unvalued(position: Position, quote_error: Option<String>) -> Self {
        Self {
            position,
            market_price: None,
            market_value: None,
            market_value_base: None,
            unrealized_pnl: None,
            unrealized_pnl_base: None,
            day_change: None,
            day_change_base: None,
            quote_error,
        }
    }

    pub fn is_valued(&self) -> bool {
        self.market_value.is_some()
    }
}

/// Valued positions with base-currency totals over open, valued positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioValuation {
    pub base_currency: String,
    pub positions: Vec<ValuedPosition>,
    pub total_market_value_base: Decimal,
    pub total_cost_base: Decimal,
    pub total_unrealized_pnl_base: Decimal,
    pub total_day_change_base: Decimal,
    /// Realized P&L of every position, open or closed
    pub total_realized_pnl_base: Decimal,
    /// Open positions left without a market value
    pub unvalued_count: usize,
    pub estimated_fx: bool,
}
