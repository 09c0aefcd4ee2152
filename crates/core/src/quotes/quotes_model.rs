use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Latest market price of a symbol, quoted in the symbol's trading currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveQuote {
    pub symbol: String,
    pub price: Decimal,
    /// Absolute change since the previous close
    pub day_change: Option<Decimal>,
    pub updated_at: DateTime<Utc>,
}

/// Body of a manual quote update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteUpdate {
    pub price: Decimal,
    #[serde(default)]
    pub day_change: Option<Decimal>,
}
