use log::{debug, warn};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use super::income_model::{IncomeCurrencyTotal, IncomeSummary};
use crate::fx::FxRateTable;
use crate::trades::{DateRange, IncomeRecord, IncomeType};

/// Totals income per currency and in base currency at each record's date rate.
pub fn summarize_income(income: &[IncomeRecord], rates: &FxRateTable) -> IncomeSummary {
    let mut summary = IncomeSummary {
        base_currency: rates.base_currency().to_string(),
        record_count: income.len(),
        period: DateRange::covering(income.iter().map(|r| r.date)),
        ..Default::default()
    };
    let mut by_currency: BTreeMap<&str, IncomeCurrencyTotal> = BTreeMap::new();

    for record in income {
        let rate = match rates.rate(&record.currency, record.date) {
            Some(obs) => {
                summary.estimated_fx |= obs.is_estimated();
                obs.rate_to_base
            }
            None => {
                warn!(
                    "No {} rate on {} for income '{}', converting at 1",
                    record.currency, record.date, record.description
                );
                summary.estimated_fx = true;
                Decimal::ONE
            }
        };
        let amount_base = record.amount * rate;

        let entry = by_currency
            .entry(record.currency.as_str())
            .or_insert_with(|| IncomeCurrencyTotal {
                currency: record.currency.clone(),
                ..Default::default()
            });
        match record.income_type {
            IncomeType::Dividend => {
                entry.dividends += record.amount;
                summary.dividends_base += amount_base;
            }
            IncomeType::Interest => {
                entry.interest += record.amount;
                summary.interest_base += amount_base;
            }
            IncomeType::Other => {
                entry.other += record.amount;
                summary.other_base += amount_base;
            }
        }
        entry.total += record.amount;
        entry.total_base += amount_base;
        summary.total_base += amount_base;
    }

    summary.by_currency = by_currency.into_values().collect();
    debug!(
        "Summarized {} income records into {} currencies",
        summary.record_count,
        summary.by_currency.len()
    );
    summary
}
