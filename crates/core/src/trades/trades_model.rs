//! Canonical trade, income and forex records produced by the normalizer.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{Error, ValidationError};

/// Direction of a trade, inferred from the sign of the statement quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeAction {
    Buy,
    Sell,
}

impl TradeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeAction::Buy => "BUY",
            TradeAction::Sell => "SELL",
        }
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradeAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(TradeAction::Buy),
            "SELL" => Ok(TradeAction::Sell),
            other => Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Unknown trade action '{}'",
                other
            )))),
        }
    }
}

/// Kind of cash income recorded from a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IncomeType {
    Dividend,
    Interest,
    Other,
}

impl IncomeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncomeType::Dividend => "DIVIDEND",
            IncomeType::Interest => "INTEREST",
            IncomeType::Other => "OTHER",
        }
    }
}

impl fmt::Display for IncomeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IncomeType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DIVIDEND" => Ok(IncomeType::Dividend),
            "INTEREST" => Ok(IncomeType::Interest),
            "OTHER" => Ok(IncomeType::Other),
            other => Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Unknown income type '{}'",
                other
            )))),
        }
    }
}

/// A single normalized security trade.
///
/// `quantity` is always positive; the direction lives in `action`.
/// `realized_pnl` is the broker's own figure and, when present, replaces the
/// running realized P&L of the position at this point in trade order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeRecord {
    pub trade_date: NaiveDate,
    pub settle_date: Option<NaiveDate>,
    pub symbol: String,
    pub asset_class: String,
    pub action: TradeAction,
    pub quantity: Decimal,
    pub price: Decimal,
    pub currency: String,
    /// FX rate printed on the statement row. Advisory only.
    pub fx_rate: Option<Decimal>,
    pub realized_pnl: Option<Decimal>,
    pub commission: Decimal,
    pub fees: Decimal,
    /// 1-based line number in the source file
    pub source_row: usize,
    pub import_key: String,
}

impl TradeRecord {
    /// Gross trade value before charges.
    pub fn gross_amount(&self) -> Decimal {
        self.quantity * self.price
    }

    /// Commission plus fees.
    pub fn charges(&self) -> Decimal {
        self.commission + self.fees
    }
}

/// A dividend, interest or other cash income line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeRecord {
    pub date: NaiveDate,
    pub symbol: String,
    pub income_type: IncomeType,
    pub amount: Decimal,
    pub currency: String,
    pub description: String,
    pub source_row: usize,
    pub import_key: String,
}

/// A currency conversion trade (`AAA.BBB` pair) kept as a raw FX observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForexTrade {
    pub trade_date: NaiveDate,
    /// Pair as printed, e.g. `SGD.HKD`
    pub pair: String,
    /// Currency being bought or sold (left side)
    pub base_ccy: String,
    /// Currency the price is quoted in (right side)
    pub quote_ccy: String,
    pub quantity: Decimal,
    /// Units of `quote_ccy` per unit of `base_ccy`
    pub price: Decimal,
    pub source_row: usize,
    pub import_key: String,
}

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Smallest range covering every date, or `None` when there are none.
    pub fn covering<I>(dates: I) -> Option<Self>
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        dates.into_iter().fold(None, |acc, d| match acc {
            None => Some(DateRange { start: d, end: d }),
            Some(r) => Some(DateRange {
                start: r.start.min(d),
                end: r.end.max(d),
            }),
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}
