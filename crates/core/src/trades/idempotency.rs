//! Identity keys for statement records.
//!
//! A statement re-exported over an overlapping period repeats rows that were
//! already imported. Keys are computed from each record's semantic content so
//! the storage layer can insert-if-absent on a unique index.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};

use super::{IncomeType, TradeAction};

/// Computes the identity key of a trade.
///
/// SHA-256 over date, symbol, action, quantity, price and currency.
pub fn compute_trade_key(
    trade_date: NaiveDate,
    symbol: &str,
    action: TradeAction,
    quantity: Decimal,
    price: Decimal,
    currency: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"trade|");
    hasher.update(trade_date.format("%Y-%m-%d").to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(symbol.trim().to_uppercase().as_bytes());
    hasher.update(b"|");
    hasher.update(action.as_str().as_bytes());
    hasher.update(b"|");
    hasher.update(normalize_decimal(quantity).as_bytes());
    hasher.update(b"|");
    hasher.update(normalize_decimal(price).as_bytes());
    hasher.update(b"|");
    hasher.update(currency.trim().to_uppercase().as_bytes());

    hex::encode(hasher.finalize())
}

/// Computes the identity key of an income line.
pub fn compute_income_key(
    date: NaiveDate,
    symbol: &str,
    income_type: IncomeType,
    amount: Decimal,
    currency: &str,
    description: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"income|");
    hasher.update(date.format("%Y-%m-%d").to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(symbol.trim().to_uppercase().as_bytes());
    hasher.update(b"|");
    hasher.update(income_type.as_str().as_bytes());
    hasher.update(b"|");
    hasher.update(normalize_decimal(amount).as_bytes());
    hasher.update(b"|");
    hasher.update(currency.trim().to_uppercase().as_bytes());
    hasher.update(b"|");
    hasher.update(normalize_description(description).as_bytes());

    hex::encode(hasher.finalize())
}

/// Computes the identity key of a forex conversion.
pub fn compute_forex_key(
    trade_date: NaiveDate,
    pair: &str,
    quantity: Decimal,
    price: Decimal,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"forex|");
    hasher.update(trade_date.format("%Y-%m-%d").to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(pair.trim().to_uppercase().as_bytes());
    hasher.update(b"|");
    hasher.update(normalize_decimal(quantity).as_bytes());
    hasher.update(b"|");
    hasher.update(normalize_decimal(price).as_bytes());

    hex::encode(hasher.finalize())
}

/// Remove trailing zeros so `10` and `10.0000` hash alike
fn normalize_decimal(d: Decimal) -> String {
    d.normalize().to_string()
}

fn normalize_description(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
