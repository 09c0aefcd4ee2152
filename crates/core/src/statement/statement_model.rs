use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::columns::{Column, COLUMNS};

/// Statement sections the importer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SectionKind {
    Trades,
    Dividends,
    Interest,
    Statement,
}

impl SectionKind {
    /// Maps the first cell of a row to a section. Unknown names yield `None`.
    pub fn from_marker(marker: &str) -> Option<Self> {
        match marker.trim() {
            "Trades" => Some(SectionKind::Trades),
            "Dividends" => Some(SectionKind::Dividends),
            "Interest" => Some(SectionKind::Interest),
            "Statement" => Some(SectionKind::Statement),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKind::Trades => "Trades",
            SectionKind::Dividends => "Dividends",
            SectionKind::Interest => "Interest",
            SectionKind::Statement => "Statement",
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Second cell of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Header,
    Data,
    /// `Total`, `SubTotal`, `Notes` and anything else
    Other,
}

impl RowKind {
    pub fn from_marker(marker: &str) -> Self {
        let marker = marker.trim();
        if marker.eq_ignore_ascii_case("header") {
            RowKind::Header
        } else if marker.eq_ignore_ascii_case("data") {
            RowKind::Data
        } else {
            RowKind::Other
        }
    }
}

/// Column positions resolved once from a header row.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderIndex {
    names: Vec<String>,
    positions: HashMap<Column, usize>,
}

impl HeaderIndex {
    pub fn new<I, S>(cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: Vec<String> = cells
            .into_iter()
            .map(|c| c.as_ref().trim().to_lowercase())
            .collect();
        let positions = COLUMNS
            .iter()
            .filter_map(|(column, _)| column.locate(&names).map(|pos| (*column, pos)))
            .collect();
        Self { names, positions }
    }

    /// Lowercased header names in file order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn has(&self, column: Column) -> bool {
        self.positions.contains_key(&column)
    }

    pub fn position(&self, column: Column) -> Option<usize> {
        self.positions.get(&column).copied()
    }

    /// Trimmed value of `column` in `row`, or `""` when the column or cell is missing.
    pub fn value<'r>(&self, row: &'r RawRow, column: Column) -> &'r str {
        self.position(column)
            .and_then(|pos| row.cells.get(pos))
            .map(|cell| cell.trim())
            .unwrap_or("")
    }
}

/// Data cells of one row, without the section and kind markers.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    /// 1-based line number in the source file
    pub line: usize,
    pub cells: Vec<String>,
}

/// One header row of a section and the data rows that followed it.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionBlock {
    pub section: SectionKind,
    pub header: HeaderIndex,
    pub rows: Vec<RawRow>,
}

/// Why a row was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RowErrorKind {
    /// Fewer than two cells, or the row could not be tokenized
    Malformed,
    /// Data row of a known section with no active header
    Orphan,
    Encoding,
    MissingField,
    InvalidDate,
    InvalidNumber,
    ZeroQuantity,
}

/// A row-level problem. The row is skipped and processing continues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowError {
    /// 1-based line number, absent for file-level notes such as encoding
    pub line: Option<usize>,
    pub section: Option<SectionKind>,
    pub kind: RowErrorKind,
    pub message: String,
}

impl RowError {
    pub fn new(
        line: Option<usize>,
        section: Option<SectionKind>,
        kind: RowErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            line,
            section,
            kind,
            message: message.into(),
        }
    }

    pub fn at(line: usize, section: SectionKind, kind: RowErrorKind, message: impl Into<String>) -> Self {
        Self::new(Some(line), Some(section), kind, message)
    }
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.line, self.section) {
            (Some(line), Some(section)) => write!(f, "line {} ({}): {}", line, section, self.message),
            (Some(line), None) => write!(f, "line {}: {}", line, self.message),
            _ => f.write_str(&self.message),
        }
    }
}

/// Parser output: section blocks in file order plus row errors.
#[derive(Debug, Clone, Default)]
pub struct ParsedStatement {
    pub blocks: Vec<SectionBlock>,
    pub errors: Vec<RowError>,
    /// Number of records tokenized from the file
    pub row_count: usize,
}

impl ParsedStatement {
    pub fn blocks_of(&self, section: SectionKind) -> impl Iterator<Item = &SectionBlock> {
        self.blocks.iter().filter(move |b| b.section == section)
    }

    /// Total data rows captured for `section`.
    pub fn data_row_count(&self, section: SectionKind) -> usize {
        self.blocks_of(section).map(|b| b.rows.len()).sum()
    }
}
