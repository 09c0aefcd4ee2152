//! Valuation module - open positions joined with live quotes.

pub mod valuation_calculator;
mod valuation_model;

pub use valuation_calculator::value_positions;
pub use valuation_model::{PortfolioValuation, ValuedPosition};
