//! End-to-end transform: statement bytes to positions.
//!
//! `bytes -> parse -> normalize -> resolve FX -> fold positions`.
//! Everything here is pure and synchronous; persistence happens in the
//! import service around it.

use chrono::NaiveDate;
use log::info;
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::constants::DEFAULT_BASE_CURRENCY;
use crate::fx::{default_rates_for, FxResolution, FxResolver};
use crate::portfolio::positions::{PositionCalculator, PositionFoldResult};
use crate::statement::{normalize_statement, parse_statement, NormalizedStatement};
use crate::trades::{ForexTrade, IncomeRecord, TradeRecord};
use crate::Result;

/// Settings for FX normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportConfig {
    pub base_currency: String,
    /// Fallback rate-to-base per currency
    pub default_rates: HashMap<String, Decimal>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self::for_base_currency(DEFAULT_BASE_CURRENCY)
    }
}

impl ImportConfig {
    /// Config for `base_currency` with the built-in defaults crossed into it.
    pub fn for_base_currency(base_currency: &str) -> Self {
        let base_currency = base_currency.trim().to_uppercase();
        Self {
            default_rates: default_rates_for(&base_currency),
            base_currency,
        }
    }

    pub fn resolver(&self) -> FxResolver {
        FxResolver::new(self.base_currency.clone(), self.default_rates.clone())
    }
}

/// Rates and positions rebuilt from a set of records.
#[derive(Debug, Clone, Default)]
pub struct Reconstruction {
    pub fx: FxResolution,
    pub positions: PositionFoldResult,
}

/// Output of running one statement through the pipeline.
#[derive(Debug, Clone)]
pub struct StatementRun {
    pub statement: NormalizedStatement,
    pub reconstruction: Reconstruction,
}

/// Parses, normalizes and folds a single statement file.
pub fn run_pipeline(content: &[u8], config: &ImportConfig) -> Result<StatementRun> {
    let parsed = parse_statement(content)?;
    let statement = normalize_statement(&parsed);
    let reconstruction = reconstruct(
        &statement.trades,
        &statement.income,
        &statement.forex,
        config,
    );

    info!(
        "Statement processed: {} trades, {} income, {} conversions, {} row errors, {} positions",
        statement.trades.len(),
        statement.income.len(),
        statement.forex.len(),
        statement.errors.len(),
        reconstruction.positions.positions.len()
    );

    Ok(StatementRun {
        statement,
        reconstruction,
    })
}

/// Resolves rates for every trade and income day, then folds positions.
pub fn reconstruct(
    trades: &[TradeRecord],
    income: &[IncomeRecord],
    forex: &[ForexTrade],
    config: &ImportConfig,
) -> Reconstruction {
    let fx = config.resolver().resolve(forex, required_rate_keys(trades, income));
    let positions = PositionCalculator::new(&fx.table).calculate(trades);
    Reconstruction { fx, positions }
}

/// Every `(currency, date)` a trade or income record needs converted.
pub fn required_rate_keys(
    trades: &[TradeRecord],
    income: &[IncomeRecord],
) -> Vec<(String, NaiveDate)> {
    trades
        .iter()
        .map(|t| (t.currency.clone(), t.trade_date))
        .chain(income.iter().map(|i| (i.currency.clone(), i.date)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fx::FxProvenance;
    use crate::portfolio::positions::PositionStatus;
    use rust_decimal_macros::dec;

    const STATEMENT: &str = "Statement,Header,Field Name,Field Value\n\
Statement,Data,BrokerName,Interactive Brokers\n\
Statement,Data,Period,\"January 1, 2026 - January 31, 2026\"\n\
Trades,Header,DataDiscriminator,Asset Category,Currency,Symbol,Date/Time,Quantity,T. Price,Proceeds,Comm/Fee,Realized P/L\n\
Trades,Data,Order,Forex,HKD,SGD.HKD,\"2026-01-20, 09:00:00\",1000,6.07482,-6074.82,-2,\n\
Trades,Data,Order,Forex,HKD,SGD.HKD,\"2026-01-20, 09:30:00\",1000,6.10,-6100,-2,\n\
Trades,Data,Order,Stocks,HKD,0700.HK,\"2026-01-20, 10:00:00\",100,300,-30000,-10,0\n\
Trades,Data,Order,Stocks,USD,AAPL,\"2026-01-21, 10:00:00\",10,100,-1000,-1,0\n\
Trades,Total,,Stocks,,,,,,,,\n\
Interest,Header,Currency,Date,Description,Amount\n\
Interest,Data,SGD,2026-01-31,SGD Credit Interest,4.56\n";

    #[test]
    fn test_default_config_is_sgd() {
        let config = ImportConfig::default();
        assert_eq!(config.base_currency, "SGD");
        assert_eq!(config.default_rates.get("USD"), Some(&dec!(1.35)));
    }

    #[test]
    fn test_pipeline_end_to_end() {
        let run = run_pipeline(STATEMENT.as_bytes(), &ImportConfig::default()).unwrap();

        assert_eq!(run.statement.trades.len(), 2);
        assert_eq!(run.statement.forex.len(), 2);
        assert_eq!(run.statement.income.len(), 1);
        assert_eq!(
            run.statement.metadata.broker_name.as_deref(),
            Some("Interactive Brokers")
        );

        let fx = &run.reconstruction.fx;
        let date = NaiveDate::from_ymd_opt(2026, 1, 20).unwrap();
        let hkd = fx.table.rate("HKD", date).unwrap();
        assert_eq!(hkd.provenance, FxProvenance::Observed);
        assert!((hkd.rate_to_base - dec!(0.164275)).abs() < dec!(0.00001));

        // USD on the 21st was never converted
        assert_eq!(fx.warnings.len(), 1);
        assert_eq!(fx.warnings[0].currency, "USD");

        let positions = &run.reconstruction.positions;
        let tencent = positions.get("0700").unwrap();
        assert_eq!(tencent.status, PositionStatus::Open);
        assert_eq!(tencent.total_cost, dec!(30010));
        assert!(!tencent.estimated_fx);
        assert!((tencent.total_cost_base - dec!(30010) * hkd.rate_to_base).abs() < dec!(0.000001));

        let aapl = positions.get("AAPL").unwrap();
        assert!(aapl.estimated_fx);
        assert_eq!(aapl.total_cost_base, dec!(1001) * dec!(1.35));
    }

    #[test]
    fn test_pipeline_survives_out_of_range_rows() {
        let content = "Trades,Header,Symbol,Currency,Date/Time,Quantity,T. Price\n\
Trades,Data,AAPL,SGD,2026-01-20,100000000000000,1000000000000000\n\
Trades,Data,D05,SGD,2026-01-20,10,30\n\
Trades,Data,USD.SGD,SGD,2026-01-21,1,50000000000000000000000000000\n\
Trades,Data,USD.SGD,SGD,2026-01-21,1,50000000000000000000000000000\n";

        let run = run_pipeline(content.as_bytes(), &ImportConfig::default()).unwrap();

        assert_eq!(run.statement.errors.len(), 1);
        assert_eq!(run.reconstruction.positions.positions.len(), 1);
        let dbs = run.reconstruction.positions.get("D05").unwrap();
        assert_eq!(dbs.total_cost, dec!(300));
        let date = NaiveDate::from_ymd_opt(2026, 1, 21).unwrap();
        assert!(run.reconstruction.fx.table.rate("USD", date).is_none());
    }

    #[test]
    fn test_pipeline_rejects_empty_file() {
        assert!(run_pipeline(b"", &ImportConfig::default()).is_err());
    }
}
