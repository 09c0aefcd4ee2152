use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::trades::DateRange;

/// Income totals in one currency.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeCurrencyTotal {
    pub currency: String,
    pub dividends: Decimal,
    pub interest: Decimal,
    pub other: Decimal,
    pub total: Decimal,
    pub total_base: Decimal,
}

/// Dividend and interest totals per currency and in base currency.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeSummary {
    pub base_currency: String,
    pub by_currency: Vec<IncomeCurrencyTotal>,
    pub dividends_base: Decimal,
    pub interest_base: Decimal,
    pub other_base: Decimal,
    pub total_base: Decimal,
    pub record_count: usize,
    pub period: Option<DateRange>,
    /// True if any amount was converted at a fallback rate
    pub estimated_fx: bool,
}
