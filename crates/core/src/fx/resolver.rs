//! Same-day FX rate resolution from statement conversions.
//!
//! A conversion `A.B` at price `p` trades `p` units of `B` per unit of `A`.
//! With base currency `BASE`, `BASE.X @ p` observes `X = 1/p` and
//! `X.BASE @ p` observes `X = p`. Observations for the same currency and day
//! are averaged.

use chrono::NaiveDate;
use log::{debug, warn};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::fx_model::{
    FxFallbackReason, FxFallbackWarning, FxObservation, FxProvenance, FxRateTable,
};
use crate::trades::ForexTrade;

/// Resolver output.
#[derive(Debug, Clone, Default)]
pub struct FxResolution {
    pub table: FxRateTable,
    pub warnings: Vec<FxFallbackWarning>,
}

/// Builds rate tables for one base currency.
#[derive(Debug, Clone)]
pub struct FxResolver {
    base_currency: String,
    defaults: HashMap<String, Decimal>,
}

impl FxResolver {
    pub fn new(base_currency: impl Into<String>, defaults: HashMap<String, Decimal>) -> Self {
        Self {
            base_currency: base_currency.into().trim().to_uppercase(),
            defaults: defaults
                .into_iter()
                .map(|(code, rate)| (code.to_uppercase(), rate))
                .collect(),
        }
    }

    pub fn base_currency(&self) -> &str {
        &self.base_currency
    }

    /// Rate-to-base implied by one conversion, or `None` when the pair does
    /// not involve the base currency or the price is unusable.
    pub fn observe(&self, forex: &ForexTrade) -> Option<(String, Decimal)> {
        if forex.price.is_zero() || forex.price.is_sign_negative() {
            warn!(
                "Skipping {} conversion on {} with price {}",
                forex.pair, forex.trade_date, forex.price
            );
            return None;
        }

        let base = self.base_currency.as_str();
        if forex.base_ccy == base && forex.quote_ccy != base {
            match Decimal::ONE.checked_div(forex.price) {
                Some(rate) => Some((forex.quote_ccy.clone(), rate)),
                None => {
                    warn!("Rate overflow inverting {} @ {}", forex.pair, forex.price);
                    None
                }
            }
        } else if forex.quote_ccy == base && forex.base_ccy != base {
            Some((forex.base_ccy.clone(), forex.price))
        } else {
            debug!(
                "Ignoring {} conversion on {}: pair does not involve {}",
                forex.pair, forex.trade_date, base
            );
            None
        }
    }

    /// Resolves a rate for every observed day and every `required` key.
    ///
    /// Required keys without an observation fall back to the built-in
    /// default, or 1 for currencies without one, and each fallback is
    /// returned as a warning.
    pub fn resolve<I>(&self, forex: &[ForexTrade], required: I) -> FxResolution
    where
        I: IntoIterator<Item = (String, NaiveDate)>,
    {
        let mut samples: BTreeMap<(String, NaiveDate), Vec<Decimal>> = BTreeMap::new();
        for fx in forex {
            if let Some((currency, rate)) = self.observe(fx) {
                samples
                    .entry((currency, fx.trade_date))
                    .or_default()
                    .push(rate);
            }
        }

        let mut table = FxRateTable::new(self.base_currency.clone());
        for ((currency, date), rates) in samples {
            let count = rates.len();
            let Some(sum) = rates
                .iter()
                .try_fold(Decimal::ZERO, |acc, rate| acc.checked_add(*rate))
            else {
                warn!(
                    "Dropping {} observations on {}: rate sum overflowed",
                    currency, date
                );
                continue;
            };
            let mean = sum / Decimal::from(count);
            table.insert(FxObservation {
                currency,
                date,
                rate_to_base: mean,
                provenance: FxProvenance::Observed,
                sample_count: count,
            });
        }

        let missing: BTreeSet<(String, NaiveDate)> = required
            .into_iter()
            .map(|(currency, date)| (currency.trim().to_uppercase(), date))
            .filter(|(currency, date)| {
                !currency.is_empty() && table.rate(currency, *date).is_none()
            })
            .collect();

        let mut warnings = Vec::with_capacity(missing.len());
        for (currency, date) in missing {
            let (rate, reason) = match self.defaults.get(&currency) {
                Some(rate) => (*rate, FxFallbackReason::DefaultRate),
                None => (Decimal::ONE, FxFallbackReason::UnknownCurrency),
            };
            warn!(
                "No {} conversion observed on {}, using default rate {} ({:?})",
                currency, date, rate, reason
            );
            table.insert(FxObservation {
                currency: currency.clone(),
                date,
                rate_to_base: rate,
                provenance: FxProvenance::Default,
                sample_count: 0,
            });
            warnings.push(FxFallbackWarning {
                currency,
                date,
                rate_to_base: rate,
                reason,
            });
        }

        debug!(
            "Resolved {} FX rates into {} ({} fallbacks)",
            table.len(),
            self.base_currency,
            warnings.len()
        );

        FxResolution { table, warnings }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fx::sgd_default_rates;
    use rust_decimal_macros::dec;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, day).unwrap()
    }

    fn fx(pair: &str, day: u32, price: Decimal) -> ForexTrade {
        let (base_ccy, quote_ccy) = pair.split_once('.').unwrap();
        ForexTrade {
            trade_date: d(day),
            pair: pair.to_string(),
            base_ccy: base_ccy.to_string(),
            quote_ccy: quote_ccy.to_string(),
            quantity: dec!(1000),
            price,
            source_row: 1,
            import_key: format!("{}-{}-{}", pair, day, price),
        }
    }

    fn resolver() -> FxResolver {
        FxResolver::new("SGD", sgd_default_rates())
    }

    #[test]
    fn test_same_day_conversions_are_averaged() {
        let forex = vec![fx("SGD.HKD", 20, dec!(6.07482)), fx("SGD.HKD", 20, dec!(6.10))];

        let resolution = resolver().resolve(&forex, vec![("HKD".to_string(), d(20))]);

        let hkd = resolution.table.rate("HKD", d(20)).unwrap();
        assert_eq!(hkd.provenance, FxProvenance::Observed);
        assert_eq!(hkd.sample_count, 2);
        assert!((hkd.rate_to_base - dec!(0.164275)).abs() < dec!(0.00001));
        assert!(resolution.warnings.is_empty());
    }

    #[test]
    fn test_pair_quoted_in_base() {
        let forex = vec![fx("USD.SGD", 5, dec!(1.3421))];

        let resolution = resolver().resolve(&forex, Vec::new());

        let usd = resolution.table.rate("USD", d(5)).unwrap();
        assert_eq!(usd.rate_to_base, dec!(1.3421));
    }

    #[test]
    fn test_reciprocal_pairs_agree() {
        let price = dec!(7.8);
        let forward = resolver().resolve(&[fx("SGD.HKD", 3, price)], Vec::new());
        let backward = resolver().resolve(&[fx("HKD.SGD", 3, dec!(1) / price)], Vec::new());

        let a = forward.table.rate("HKD", d(3)).unwrap().rate_to_base;
        let b = backward.table.rate("HKD", d(3)).unwrap().rate_to_base;
        assert!((a - b).abs() < dec!(0.000000001));
    }

    #[test]
    fn test_cross_pairs_and_zero_prices_are_ignored() {
        let forex = vec![fx("USD.HKD", 3, dec!(7.8)), fx("SGD.EUR", 3, dec!(0))];

        let resolution = resolver().resolve(&forex, Vec::new());

        assert!(resolution.table.is_empty());
    }

    #[test]
    fn test_overflowing_same_day_rates_are_dropped() {
        let huge = Decimal::from_str_exact("50000000000000000000000000000").unwrap();
        let forex = vec![
            fx("USD.SGD", 5, huge),
            fx("USD.SGD", 5, huge),
            fx("USD.SGD", 6, dec!(1.34)),
        ];

        let resolution = resolver().resolve(&forex, vec![("USD".to_string(), d(5))]);

        let dropped = resolution.table.rate("USD", d(5)).unwrap();
        assert_eq!(dropped.provenance, FxProvenance::Default);
        assert_eq!(resolution.warnings.len(), 1);
        let kept = resolution.table.rate("USD", d(6)).unwrap();
        assert_eq!(kept.rate_to_base, dec!(1.34));
    }

    #[test]
    fn test_missing_days_fall_back_to_defaults() {
        let forex = vec![fx("USD.SGD", 5, dec!(1.34))];
        let required = vec![
            ("USD".to_string(), d(5)),
            ("USD".to_string(), d(6)),
            ("XYZ".to_string(), d(6)),
            ("SGD".to_string(), d(6)),
        ];

        let resolution = resolver().resolve(&forex, required);

        let observed = resolution.table.rate("USD", d(5)).unwrap();
        assert_eq!(observed.provenance, FxProvenance::Observed);

        let fallback = resolution.table.rate("USD", d(6)).unwrap();
        assert_eq!(fallback.provenance, FxProvenance::Default);
        assert_eq!(fallback.rate_to_base, dec!(1.35));

        let unknown = resolution.table.rate("XYZ", d(6)).unwrap();
        assert_eq!(unknown.rate_to_base, Decimal::ONE);
        assert!(unknown.is_estimated());

        assert_eq!(resolution.warnings.len(), 2);
        assert_eq!(resolution.warnings[0].currency, "USD");
        assert_eq!(resolution.warnings[0].reason, FxFallbackReason::DefaultRate);
        assert_eq!(resolution.warnings[1].reason, FxFallbackReason::UnknownCurrency);
    }
}
