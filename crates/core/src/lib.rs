//! Ledgerfold Core - statement ingestion, FX resolution and position reconstruction.
//!
//! This crate contains the domain logic for turning a brokerage activity statement
//! into trades, income, resolved exchange rates and average-cost positions.
//! It performs no I/O of its own and defines the repository traits that the
//! `storage-sqlite` crate implements.

pub mod constants;
pub mod errors;
pub mod fx;
pub mod imports;
pub mod pipeline;
pub mod portfolio;
pub mod quotes;
pub mod statement;
pub mod trades;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
