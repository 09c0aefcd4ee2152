pub mod income_calculator;
mod income_model;

pub use income_calculator::summarize_income;
pub use income_model::{IncomeCurrencyTotal, IncomeSummary};
