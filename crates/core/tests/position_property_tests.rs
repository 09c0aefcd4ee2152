//! Property-based integration tests for position reconstruction and FX resolution.
//!
//! These tests verify that the average-cost fold and the rate resolver hold
//! their accounting identities across random inputs, using the `proptest`
//! crate for random test case generation.

use chrono::{Days, NaiveDate};
use ledgerfold_core::fx::{FxRateTable, FxResolver};
use ledgerfold_core::portfolio::positions::{PositionCalculator, PositionStatus};
use ledgerfold_core::trades::{
    compute_forex_key, compute_trade_key, ForexTrade, TradeAction, TradeRecord,
};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::collections::HashMap;

// =============================================================================
// Generators
// =============================================================================

fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 2).unwrap()
}

/// Whole-share quantities.
fn arb_quantity() -> impl Strategy<Value = Decimal> {
    (1i64..5_000).prop_map(Decimal::from)
}

/// Prices with two decimal places.
fn arb_price() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

fn arb_commission() -> impl Strategy<Value = Decimal> {
    (0i64..2_000).prop_map(|cents| Decimal::new(cents, 2))
}

/// A strictly positive FX price with up to six decimals.
fn arb_fx_price() -> impl Strategy<Value = Decimal> {
    (1_000i64..50_000_000).prop_map(|micros| Decimal::new(micros, 6))
}

fn arb_lot() -> impl Strategy<Value = (Decimal, Decimal, Decimal)> {
    (arb_quantity(), arb_price(), arb_commission())
}

fn trade(
    day: u64,
    action: TradeAction,
    quantity: Decimal,
    price: Decimal,
    commission: Decimal,
    source_row: usize,
) -> TradeRecord {
    let date = start_date() + Days::new(day);
    TradeRecord {
        trade_date: date,
        settle_date: None,
        symbol: "D05".to_string(),
        asset_class: "Stocks".to_string(),
        action,
        quantity,
        price,
        currency: "SGD".to_string(),
        fx_rate: None,
        realized_pnl: None,
        commission,
        fees: Decimal::ZERO,
        source_row,
        import_key: compute_trade_key(date, "D05", action, quantity, price, "SGD"),
    }
}

fn conversion(pair: &str, price: Decimal) -> ForexTrade {
    let (base_ccy, quote_ccy) = pair.split_once('.').unwrap();
    ForexTrade {
        trade_date: start_date(),
        pair: pair.to_string(),
        base_ccy: base_ccy.to_string(),
        quote_ccy: quote_ccy.to_string(),
        quantity: Decimal::from(1000),
        price,
        source_row: 1,
        import_key: compute_forex_key(start_date(), pair, Decimal::from(1000), price),
    }
}

fn close_enough(left: Decimal, right: Decimal, tolerance: Decimal) -> bool {
    (left - right).abs() <= tolerance
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Buying only accumulates quantity and cost, and the average is their ratio.
    #[test]
    fn prop_buy_only_accumulates(lots in prop::collection::vec(arb_lot(), 1..20)) {
        let trades: Vec<TradeRecord> = lots
            .iter()
            .enumerate()
            .map(|(i, (qty, price, comm))| trade(i as u64, TradeAction::Buy, *qty, *price, *comm, i + 1))
            .collect();
        let rates = FxRateTable::new("SGD");

        let result = PositionCalculator::new(&rates).calculate(&trades);
        let position = result.get("D05").unwrap();

        let expected_qty: Decimal = lots.iter().map(|(qty, _, _)| *qty).sum();
        let expected_cost: Decimal = lots.iter().map(|(qty, price, comm)| qty * price + comm).sum();
        prop_assert_eq!(position.quantity, expected_qty);
        prop_assert_eq!(position.total_cost, expected_cost);
        prop_assert_eq!(position.avg_cost, Some(expected_cost / expected_qty));
        prop_assert_eq!(position.realized_pnl, Decimal::ZERO);
        prop_assert_eq!(position.status, PositionStatus::Open);
        prop_assert!(result.warnings.is_empty());
    }

    /// Selling everything closes the position and realizes proceeds minus cost.
    #[test]
    fn prop_full_sell_realizes_proceeds_minus_cost(
        lots in prop::collection::vec(arb_lot(), 1..10),
        sell_price in arb_price(),
        sell_comm in arb_commission(),
    ) {
        let mut trades: Vec<TradeRecord> = lots
            .iter()
            .enumerate()
            .map(|(i, (qty, price, comm))| trade(i as u64, TradeAction::Buy, *qty, *price, *comm, i + 1))
            .collect();
        let held: Decimal = lots.iter().map(|(qty, _, _)| *qty).sum();
        let cost: Decimal = lots.iter().map(|(qty, price, comm)| qty * price + comm).sum();
        trades.push(trade(100, TradeAction::Sell, held, sell_price, sell_comm, 99));
        let rates = FxRateTable::new("SGD");

        let result = PositionCalculator::new(&rates).calculate(&trades);
        let position = result.get("D05").unwrap();

        let proceeds = held * sell_price - sell_comm;
        prop_assert_eq!(position.status, PositionStatus::Closed);
        prop_assert_eq!(position.quantity, Decimal::ZERO);
        prop_assert!(position.avg_cost.is_none());
        prop_assert!(close_enough(position.realized_pnl, proceeds - cost, Decimal::new(1, 12)));
        prop_assert!(close_enough(position.total_cost, Decimal::ZERO, Decimal::new(1, 12)));
    }

    /// Oversells never leave a negative quantity.
    #[test]
    fn prop_quantity_never_negative(
        buy in arb_lot(),
        extra in 1i64..1_000,
        sell_price in arb_price(),
    ) {
        let (qty, price, comm) = buy;
        let trades = vec![
            trade(0, TradeAction::Buy, qty, price, comm, 1),
            trade(1, TradeAction::Sell, qty + Decimal::from(extra), sell_price, Decimal::ZERO, 2),
        ];
        let rates = FxRateTable::new("SGD");

        let result = PositionCalculator::new(&rates).calculate(&trades);
        let position = result.get("D05").unwrap();

        prop_assert_eq!(position.quantity, Decimal::ZERO);
        prop_assert_eq!(position.status, PositionStatus::Closed);
        prop_assert_eq!(result.warnings.len(), 1);
    }

    /// Quoting a pair either way round observes reciprocal rates.
    #[test]
    fn prop_fx_reciprocity(price in arb_fx_price()) {
        let resolver = FxResolver::new("SGD", HashMap::new());

        let (currency, from_base) = resolver.observe(&conversion("SGD.USD", price)).unwrap();
        let (_, to_base) = resolver.observe(&conversion("USD.SGD", price)).unwrap();

        prop_assert_eq!(currency.as_str(), "USD");
        prop_assert_eq!(to_base, price);
        prop_assert!(close_enough(from_base * price, Decimal::ONE, Decimal::new(1, 9)));
    }

    /// Same-day observations resolve to their mean.
    #[test]
    fn prop_same_day_rates_average(prices in prop::collection::vec(arb_fx_price(), 1..8)) {
        let resolver = FxResolver::new("SGD", HashMap::new());
        let forex: Vec<ForexTrade> = prices.iter().map(|p| conversion("HKD.SGD", *p)).collect();

        let resolution = resolver.resolve(&forex, Vec::new());
        let observed = resolution.table.rate("HKD", start_date()).unwrap();

        let sum: Decimal = prices.iter().copied().sum();
        let mean = sum / Decimal::from(prices.len());
        prop_assert_eq!(observed.rate_to_base, mean);
        prop_assert_eq!(observed.sample_count, prices.len());
        prop_assert!(resolution.warnings.is_empty());
    }
}
