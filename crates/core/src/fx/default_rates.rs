//! Built-in fallback rates for days without an observed conversion.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;

/// SGD per unit of each currency.
fn sgd_table() -> [(&'static str, Decimal); 12] {
    [
        ("SGD", dec!(1)),
        ("USD", dec!(1.35)),
        ("HKD", dec!(0.17)),
        ("EUR", dec!(1.45)),
        ("GBP", dec!(1.70)),
        ("CNY", dec!(0.19)),
        ("CNH", dec!(0.19)),
        ("JPY", dec!(0.009)),
        ("AUD", dec!(0.88)),
        ("CAD", dec!(0.98)),
        ("CHF", dec!(1.52)),
        ("MYR", dec!(0.29)),
    ]
}

/// Default rates into SGD.
pub fn sgd_default_rates() -> HashMap<String, Decimal> {
    default_rates_for("SGD")
}

/// Default rates into `base`, crossed through the SGD table.
///
/// Returns an empty table when `base` itself has no default, in which case
/// every unobserved currency falls back to 1.
pub fn default_rates_for(base: &str) -> HashMap<String, Decimal> {
    let base = base.trim().to_uppercase();
    let table = sgd_table();
    let Some(base_in_sgd) = table
        .iter()
        .find(|(code, _)| *code == base)
        .map(|(_, rate)| *rate)
    else {
        return HashMap::new();
    };

    table
        .iter()
        .filter(|(code, _)| *code != base)
        .filter_map(|(code, rate)| {
            rate.checked_div(base_in_sgd)
                .map(|cross| (code.to_string(), cross.round_dp(8)))
        })
        .collect()
}
