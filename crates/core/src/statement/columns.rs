//! Logical columns and the header needles that locate them.
//!
//! Matching is a case-insensitive substring test of each needle against the
//! lowercased header cells. Needles are tried in order and the first header
//! containing a needle wins, so more specific needles come first.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Column {
    Discriminator,
    AssetCategory,
    Currency,
    Symbol,
    TradeDate,
    SettleDate,
    Quantity,
    Price,
    Proceeds,
    Commission,
    Fees,
    Basis,
    RealizedPnl,
    FxRate,
    Code,
    Date,
    Description,
    Amount,
    FieldName,
    FieldValue,
}

/// Column matching rules, one entry per logical column.
pub const COLUMNS: &[(Column, &[&str])] = &[
    (Column::Discriminator, &["datadiscriminator", "discriminator"]),
    (Column::AssetCategory, &["asset category", "asset class", "asset"]),
    (Column::Currency, &["currency"]),
    (Column::Symbol, &["symbol", "ticker"]),
    (Column::TradeDate, &["date/time", "trade date", "date"]),
    (Column::SettleDate, &["settle"]),
    (Column::Quantity, &["quantity", "qty"]),
    (Column::Price, &["t. price", "trade price", "price"]),
    (Column::Proceeds, &["proceeds"]),
    (Column::Commission, &["comm"]),
    (Column::Fees, &["fees"]),
    (Column::Basis, &["basis"]),
    (Column::RealizedPnl, &["realized p/l", "realized p&l", "realized"]),
    (Column::FxRate, &["fx rate", "fxrate"]),
    (Column::Code, &["code"]),
    (Column::Date, &["date"]),
    (Column::Description, &["description"]),
    (Column::Amount, &["amount"]),
    (Column::FieldName, &["field name"]),
    (Column::FieldValue, &["field value"]),
];

impl Column {
    /// Ordered needles for this column.
    pub fn needles(&self) -> &'static [&'static str] {
        COLUMNS
            .iter()
            .find(|(column, _)| column == self)
            .map(|(_, needles)| *needles)
            .unwrap_or(&[])
    }

    /// Finds this column's position among lowercased, trimmed header cells.
    pub fn locate(&self, headers: &[String]) -> Option<usize> {
        self.needles()
            .iter()
            .find_map(|needle| headers.iter().position(|h| h.contains(needle)))
    }
}
