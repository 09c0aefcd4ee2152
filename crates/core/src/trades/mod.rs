//! Trades module - canonical records and their identity keys.

mod idempotency;
mod trades_model;

pub use idempotency::{compute_forex_key, compute_income_key, compute_trade_key};
pub use trades_model::{
    DateRange, ForexTrade, IncomeRecord, IncomeType, TradeAction, TradeRecord,
};
