use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::is_quantity_closed;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionStatus {
    Open,
    Closed,
}

/// Running average-cost state of one symbol.
///
/// Native amounts are in `currency`, the currency of the first trade.
/// `*_base` mirrors are accumulated trade by trade at each trade date's rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub symbol: String,
    pub asset_class: String,
    pub currency: String,
    pub quantity: Decimal,
    pub total_cost: Decimal,
    /// `total_cost / quantity` while the position is open
    pub avg_cost: Option<Decimal>,
    pub realized_pnl: Decimal,
    pub total_cost_base: Decimal,
    pub avg_cost_base: Option<Decimal>,
    pub realized_pnl_base: Decimal,
    pub status: PositionStatus,
    /// True if any trade was converted at a fallback rate
    pub estimated_fx: bool,
    pub trade_count: usize,
    pub first_trade_date: Option<NaiveDate>,
    pub last_trade_date: Option<NaiveDate>,
}

impl Position {
    pub fn new(symbol: impl Into<String>, currency: impl Into<String>, asset_class: impl Into<String>) -> Self {
        Position {
            symbol: symbol.into(),
            asset_class: asset_class.into(),
            currency: currency.into(),
            quantity: Decimal::ZERO,
            total_cost: Decimal::ZERO,
            avg_cost: None,
            realized_pnl: Decimal::ZERO,
            total_cost_base: Decimal::ZERO,
            avg_cost_base: None,
            realized_pnl_base: Decimal::ZERO,
            status: PositionStatus::Closed,
            estimated_fx: false,
            trade_count: 0,
            first_trade_date: None,
            last_trade_date: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == PositionStatus::Open
    }

    /// Settles status and averages from the running totals.
    pub fn finalize(&mut self) {
        if is_quantity_closed(self.quantity) || self.quantity.is_sign_negative() {
            self.status = PositionStatus::Closed;
            self.avg_cost = None;
            self.avg_cost_base = None;
        } else {
            self.status = PositionStatus::Open;
            self.avg_cost = self.total_cost.checked_div(self.quantity);
            self.avg_cost_base = self.total_cost_base.checked_div(self.quantity);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClampKind {
    /// Sold more than was held; the sale was reduced to the held quantity
    Oversold,
    /// Sold with nothing held; the trade was not applied
    NothingHeld,
}

/// A sell that could not be applied as recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClampWarning {
    pub symbol: String,
    pub trade_date: NaiveDate,
    pub source_row: usize,
    pub requested: Decimal,
    pub held: Decimal,
    pub kind: ClampKind,
}

impl fmt::Display for ClampWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ClampKind::Oversold => write!(
                f,
                "{} on {} (row {}): sell of {} clamped to held {}",
                self.symbol, self.trade_date, self.source_row, self.requested, self.held
            ),
            ClampKind::NothingHeld => write!(
                f,
                "{} on {} (row {}): sell of {} with nothing held was ignored",
                self.symbol, self.trade_date, self.source_row, self.requested
            ),
        }
    }
}

/// Positions sorted by symbol plus the clamps applied while folding.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionFoldResult {
    pub positions: Vec<Position>,
    pub warnings: Vec<ClampWarning>,
}

impl PositionFoldResult {
    pub fn get(&self, symbol: &str) -> Option<&Position> {
        self.positions.iter().find(|p| p.symbol == symbol)
    }

    pub fn open_positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.iter().filter(|p| p.is_open())
    }
}
