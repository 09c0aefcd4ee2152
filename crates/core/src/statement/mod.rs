//! Statement module - section-marked activity statement parsing and normalization.

pub mod columns;
mod statement_errors;
mod statement_model;
pub mod statement_normalizer;
pub mod statement_parser;
pub mod values;

pub use columns::Column;
pub use statement_errors::StatementError;
pub use statement_model::*;
pub use statement_normalizer::{normalize_statement, NormalizedStatement, StatementMetadata};
pub use statement_parser::{parse_statement, step, Emitted, ScanState, TaggedRow};
