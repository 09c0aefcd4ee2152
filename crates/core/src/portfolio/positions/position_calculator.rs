use chrono::NaiveDate;
use log::{debug, warn};
use rayon::prelude::*;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use super::positions_model::{ClampKind, ClampWarning, Position, PositionFoldResult};
use crate::fx::FxRateTable;
use crate::trades::{TradeAction, TradeRecord};

/// Folds trades into average-cost positions.
///
/// Each symbol is folded independently over its trades in date order, ties
/// keeping their input order. Base-currency mirrors use the resolved rate of
/// each trade's own date.
#[derive(Debug, Clone, Copy)]
pub struct PositionCalculator<'a> {
    rates: &'a FxRateTable,
}

/// Rate lookup result for one trade.
#[derive(Debug, Clone, Copy)]
struct TradeRate {
    to_base: Decimal,
    estimated: bool,
}

impl<'a> PositionCalculator<'a> {
    pub fn new(rates: &'a FxRateTable) -> Self {
        Self { rates }
    }

    pub fn calculate(&self, trades: &[TradeRecord]) -> PositionFoldResult {
        let mut by_symbol: BTreeMap<&str, Vec<&TradeRecord>> = BTreeMap::new();
        for trade in trades {
            by_symbol.entry(trade.symbol.as_str()).or_default().push(trade);
        }

        let folded: Vec<(Position, Vec<ClampWarning>)> = by_symbol
            .into_par_iter()
            .map(|(symbol, mut symbol_trades)| {
                symbol_trades.sort_by_key(|t| t.trade_date);
                self.fold_symbol(symbol, &symbol_trades)
            })
            .collect();

        let mut result = PositionFoldResult::default();
        for (position, warnings) in folded {
            result.positions.push(position);
            result.warnings.extend(warnings);
        }
        result.positions.sort_by(|a, b| a.symbol.cmp(&b.symbol));

        debug!(
            "Folded {} trades into {} positions ({} clamps)",
            trades.len(),
            result.positions.len(),
            result.warnings.len()
        );
        result
    }

    /// Folds the date-ordered trades of a single symbol.
    pub fn fold_symbol(
        &self,
        symbol: &str,
        trades: &[&TradeRecord],
    ) -> (Position, Vec<ClampWarning>) {
        let (currency, asset_class) = trades
            .first()
            .map(|t| (t.currency.clone(), t.asset_class.clone()))
            .unwrap_or_default();
        let mut position = Position::new(symbol, currency, asset_class);
        let mut warnings = Vec::new();

        for trade in trades {
            position.trade_count += 1;
            position.first_trade_date.get_or_insert(trade.trade_date);
            position.last_trade_date = Some(trade.trade_date);

            let trade_rate = self.rate_for(&trade.currency, trade.trade_date, symbol);
            if trade_rate.estimated {
                position.estimated_fx = true;
            }
            let (to_position, cross_estimated) =
                self.trade_to_position_factor(trade, &position, trade_rate);
            if cross_estimated {
                position.estimated_fx = true;
            }

            let price = trade.price * to_position;
            let charges = trade.charges() * to_position;

            match trade.action {
                TradeAction::Buy => {
                    let cost = trade.quantity * price + charges;
                    position.total_cost += cost;
                    position.total_cost_base +=
                        (trade.gross_amount() + trade.charges()) * trade_rate.to_base;
                    position.quantity += trade.quantity;
                }
                TradeAction::Sell => {
                    if position.quantity <= Decimal::ZERO {
                        let warning = ClampWarning {
                            symbol: symbol.to_string(),
                            trade_date: trade.trade_date,
                            source_row: trade.source_row,
                            requested: trade.quantity,
                            held: position.quantity,
                            kind: ClampKind::NothingHeld,
                        };
                        warn!("{}", warning);
                        warnings.push(warning);
                    } else {
                        let held = position.quantity;
                        let sold = trade.quantity.min(held);
                        if trade.quantity > held {
                            let warning = ClampWarning {
                                symbol: symbol.to_string(),
                                trade_date: trade.trade_date,
                                source_row: trade.source_row,
                                requested: trade.quantity,
                                held,
                                kind: ClampKind::Oversold,
                            };
                            warn!("{}", warning);
                            warnings.push(warning);
                        }

                        let avg = position.total_cost / held;
                        let avg_base = position.total_cost_base / held;
                        let cost_of_sold = avg * sold;
                        let cost_of_sold_base = avg_base * sold;
                        let proceeds = sold * price - charges;
                        let proceeds_base =
                            (sold * trade.price - trade.charges()) * trade_rate.to_base;

                        position.realized_pnl += proceeds - cost_of_sold;
                        position.realized_pnl_base += proceeds_base - cost_of_sold_base;
                        position.total_cost -= cost_of_sold;
                        position.total_cost_base -= cost_of_sold_base;
                        position.quantity -= sold;
                    }
                }
            }

            if let Some(reported) = trade.realized_pnl {
                debug!(
                    "{} row {}: broker realized P&L {} replaces running {}",
                    symbol, trade.source_row, reported, position.realized_pnl
                );
                position.realized_pnl = reported * to_position;
                position.realized_pnl_base = reported * trade_rate.to_base;
            }
        }

        position.finalize();
        (position, warnings)
    }

    fn rate_for(&self, currency: &str, date: NaiveDate, symbol: &str) -> TradeRate {
        match self.rates.rate(currency, date) {
            Some(obs) => TradeRate {
                to_base: obs.rate_to_base,
                estimated: obs.is_estimated(),
            },
            None => {
                warn!(
                    "No {} rate on {} for {}, converting at 1",
                    currency, date, symbol
                );
                TradeRate {
                    to_base: Decimal::ONE,
                    estimated: true,
                }
            }
        }
    }

    /// Factor converting trade-currency amounts into the position currency,
    /// and whether the position currency's rate was a fallback.
    fn trade_to_position_factor(
        &self,
        trade: &TradeRecord,
        position: &Position,
        trade_rate: TradeRate,
    ) -> (Decimal, bool) {
        if trade.currency == position.currency {
            return (Decimal::ONE, false);
        }
        let position_rate = self.rate_for(&position.currency, trade.trade_date, &position.symbol);
        debug!(
            "{} row {}: converting {} into position currency {}",
            position.symbol, trade.source_row, trade.currency, position.currency
        );
        let factor = trade_rate
            .to_base
            .checked_div(position_rate.to_base)
            .unwrap_or(Decimal::ONE);
        (factor, position_rate.estimated)
    }
}
