use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::fx_errors::FxError;

/// Where a resolved rate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FxProvenance {
    /// Derived from currency conversions on the statement
    Observed,
    /// Built-in fallback, or 1 for a currency without one
    Default,
}

/// Rate to the base currency for one currency on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FxObservation {
    pub currency: String,
    pub date: NaiveDate,
    /// Base-currency units per unit of `currency`
    #[serde(serialize_with = "serialize_decimal_6")]
    pub rate_to_base: Decimal,
    pub provenance: FxProvenance,
    /// Number of conversions averaged into this rate
    pub sample_count: usize,
}

impl FxObservation {
    pub fn is_estimated(&self) -> bool {
        self.provenance == FxProvenance::Default
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FxFallbackReason {
    /// The built-in default for the currency was used
    DefaultRate,
    /// No default exists; the rate was taken as 1
    UnknownCurrency,
}

/// A day on which no conversion was observed for a currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FxFallbackWarning {
    pub currency: String,
    pub date: NaiveDate,
    pub rate_to_base: Decimal,
    pub reason: FxFallbackReason,
}

/// Resolved `(currency, date) -> rate-to-base` table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FxRateTable {
    base_currency: String,
    rates: BTreeMap<(String, NaiveDate), FxObservation>,
}

impl FxRateTable {
    pub fn new(base_currency: impl Into<String>) -> Self {
        Self {
            base_currency: base_currency.into().to_uppercase(),
            rates: BTreeMap::new(),
        }
    }

    pub fn base_currency(&self) -> &str {
        &self.base_currency
    }

    pub fn insert(&mut self, observation: FxObservation) {
        self.rates.insert(
            (observation.currency.clone(), observation.date),
            observation,
        );
    }

    pub fn is_base(&self, currency: &str) -> bool {
        currency.eq_ignore_ascii_case(&self.base_currency)
    }

    /// Rate for `currency` on `date`. The base currency is always 1.
    pub fn rate(&self, currency: &str, date: NaiveDate) -> Option<FxObservation> {
        if self.is_base(currency) {
            return Some(self.base_observation(date));
        }
        self.rates
            .get(&(currency.to_uppercase(), date))
            .cloned()
    }

    /// Most recent rate known for `currency`.
    pub fn latest(&self, currency: &str) -> Option<FxObservation> {
        let currency = currency.to_uppercase();
        if self.is_base(&currency) {
            let date = self
                .rates
                .keys()
                .map(|(_, d)| *d)
                .max()
                .unwrap_or(NaiveDate::MIN);
            return Some(self.base_observation(date));
        }
        self.rates
            .iter()
            .rev()
            .find(|((c, _), _)| *c == currency)
            .map(|(_, obs)| obs.clone())
    }

    /// All entries ordered by currency then date.
    pub fn observations(&self) -> impl Iterator<Item = &FxObservation> {
        self.rates.values()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Converts `amount` in `currency` to the base currency at `date`'s rate.
    pub fn convert_to_base(
        &self,
        amount: Decimal,
        currency: &str,
        date: NaiveDate,
    ) -> Result<Decimal, FxError> {
        self.rate(currency, date)
            .map(|obs| amount * obs.rate_to_base)
            .ok_or_else(|| FxError::RateNotFound {
                currency: currency.to_uppercase(),
                date,
            })
    }

    fn base_observation(&self, date: NaiveDate) -> FxObservation {
        FxObservation {
            currency: self.base_currency.clone(),
            date,
            rate_to_base: Decimal::ONE,
            provenance: FxProvenance::Observed,
            sample_count: 0,
        }
    }
}

fn serialize_decimal_6<S>(decimal: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let rounded = decimal.round_dp(6);
    serializer.serialize_str(&rounded.to_string())
}
