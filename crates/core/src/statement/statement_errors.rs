use thiserror::Error;

/// Conditions that abandon a statement file entirely.
///
/// Problems confined to a single row are reported as
/// [`RowError`](super::RowError) values instead.
#[derive(Error, Debug)]
pub enum StatementError {
    #[error("Statement file is empty")]
    Empty,

    #[error("No rows could be read from the statement: {0}")]
    NoRows(String),
}
