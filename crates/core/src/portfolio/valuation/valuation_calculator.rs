use futures::future::join_all;
use log::{debug, warn};
use rust_decimal::Decimal;

use super::valuation_model::{PortfolioValuation, ValuedPosition};
use crate::fx::FxRateTable;
use crate::portfolio::positions::Position;
use crate::quotes::{LiveQuote, QuoteProviderTrait};

/// Values open positions at live quotes and totals them in base currency.
///
/// Quotes are fetched concurrently. Market values convert to base at the most
/// recent resolved rate of each position's currency.
pub async fn value_positions(
    positions: &[Position],
    rates: &FxRateTable,
    provider: &dyn QuoteProviderTrait,
) -> PortfolioValuation {
    let lookups = positions.iter().map(|position| async move {
        if !position.is_open() {
            return ValuedPosition::unvalued(position.clone(), None);
        }
        match provider.get_quote(&position.symbol).await {
            Ok(quote) => value_position(position, &quote, rates),
            Err(e) => {
                warn!("Quote lookup failed for {}: {}", position.symbol, e);
                ValuedPosition::unvalued(position.clone(), Some(e.to_string()))
            }
        }
    });
    let valued = join_all(lookups).await;

    let mut valuation = PortfolioValuation {
        base_currency: rates.base_currency().to_string(),
        positions: Vec::with_capacity(valued.len()),
        total_market_value_base: Decimal::ZERO,
        total_cost_base: Decimal::ZERO,
        total_unrealized_pnl_base: Decimal::ZERO,
        total_day_change_base: Decimal::ZERO,
        total_realized_pnl_base: Decimal::ZERO,
        unvalued_count: 0,
        estimated_fx: false,
    };

    for vp in valued {
        valuation.total_realized_pnl_base += vp.position.realized_pnl_base;
        valuation.estimated_fx |= vp.position.estimated_fx;

        if vp.position.is_open() {
            valuation.total_cost_base += vp.position.total_cost_base;
            match vp.market_value_base {
                Some(value) => {
                    valuation.total_market_value_base += value;
                    valuation.total_unrealized_pnl_base +=
                        vp.unrealized_pnl_base.unwrap_or_default();
                    valuation.total_day_change_base += vp.day_change_base.unwrap_or_default();
                }
                None => valuation.unvalued_count += 1,
            }
        }
        valuation.positions.push(vp);
    }

    debug!(
        "Valued {} positions in {} ({} without quotes)",
        valuation.positions.len(),
        valuation.base_currency,
        valuation.unvalued_count
    );
    valuation
}

fn value_position(position: &Position, quote: &LiveQuote, rates: &FxRateTable) -> ValuedPosition {
    let market_value = position.quantity * quote.price;
    let unrealized = market_value - position.total_cost;
    let day_change = quote.day_change.map(|change| change * position.quantity);

    let mut valued = ValuedPosition::unvalued(position.clone(), None);
    valued.market_price = Some(quote.price);
    valued.market_value = Some(market_value);
    valued.unrealized_pnl = Some(unrealized);
    valued.day_change = day_change;

    match rates.latest(&position.currency) {
        Some(rate) => {
            let value_base = market_value * rate.rate_to_base;
            valued.market_value_base = Some(value_base);
            valued.unrealized_pnl_base = Some(value_base - position.total_cost_base);
            valued.day_change_base = day_change.map(|c| c * rate.rate_to_base);
            if rate.is_estimated() {
                valued.position.estimated_fx = true;
            }
        }
        None => {
            warn!(
                "No {} rate available to value {} in {}",
                position.currency,
                position.symbol,
                rates.base_currency()
            );
            valued.quote_error = Some(format!("No {} exchange rate", position.currency));
        }
    }
    valued
}
