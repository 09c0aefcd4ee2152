//! Portfolio module - positions, valuation and income derived from the ledger.

pub mod income;
pub mod positions;
pub mod valuation;
