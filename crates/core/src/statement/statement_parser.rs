//! Section-marked statement parser.
//!
//! Every row of an activity statement starts with two marker cells:
//! the section name and the row kind (`Header`, `Data`, `Total`, ...).
//! The parser tokenizes the file with the `csv` crate and threads an explicit
//! [`ScanState`] through [`step`] to group data rows under their header.

use csv::ReaderBuilder;
use log::{debug, warn};

use super::statement_errors::StatementError;
use super::statement_model::{
    HeaderIndex, ParsedStatement, RawRow, RowError, RowErrorKind, RowKind, SectionBlock,
    SectionKind,
};
use crate::Result;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// A tokenized row with its markers split off.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedRow {
    pub line: usize,
    pub section: String,
    pub kind: RowKind,
    pub cells: Vec<String>,
}

/// Scanner state between rows.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanState {
    NoSection,
    InSection(SectionBlock),
}

/// What a single step hands back besides the next state.
#[derive(Debug, Clone, PartialEq)]
pub enum Emitted {
    Nothing,
    /// A finished block, closed by a following header
    Block(SectionBlock),
    Error(RowError),
}

/// Advances the scanner by one row.
pub fn step(state: ScanState, row: TaggedRow) -> (ScanState, Emitted) {
    let section = SectionKind::from_marker(&row.section);

    match row.kind {
        RowKind::Header => {
            let closed = match state {
                ScanState::InSection(block) => Emitted::Block(block),
                ScanState::NoSection => Emitted::Nothing,
            };
            let next = match section {
                Some(section) => ScanState::InSection(SectionBlock {
                    section,
                    header: HeaderIndex::new(&row.cells),
                    rows: Vec::new(),
                }),
                None => ScanState::NoSection,
            };
            (next, closed)
        }
        RowKind::Data => match (state, section) {
            (ScanState::InSection(mut block), Some(section)) if block.section == section => {
                block.rows.push(RawRow {
                    line: row.line,
                    cells: row.cells,
                });
                (ScanState::InSection(block), Emitted::Nothing)
            }
            (state, Some(section)) => (
                state,
                Emitted::Error(RowError::at(
                    row.line,
                    section,
                    RowErrorKind::Orphan,
                    format!("{} data row without a preceding {} header", section, section),
                )),
            ),
            (state, None) => (state, Emitted::Nothing),
        },
        RowKind::Other => (state, Emitted::Nothing),
    }
}

/// Parses a raw statement buffer into section blocks.
///
/// Fails only when the file holds no rows at all; every other problem is
/// recorded in [`ParsedStatement::errors`].
pub fn parse_statement(content: &[u8]) -> Result<ParsedStatement> {
    let mut parsed = ParsedStatement::default();

    let text = decode_content(content, &mut parsed.errors);
    if text.trim().is_empty() {
        return Err(StatementError::Empty.into());
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut state = ScanState::NoSection;
    let mut last_tokenize_error: Option<String> = None;

    for (index, result) in reader.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                let line = e.position().map(|p| p.line() as usize);
                warn!("Skipping untokenizable statement row: {}", e);
                last_tokenize_error = Some(e.to_string());
                parsed.errors.push(RowError::new(
                    line,
                    None,
                    RowErrorKind::Malformed,
                    format!("Row could not be tokenized: {}", e),
                ));
                continue;
            }
        };
        parsed.row_count += 1;

        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(index + 1);

        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        if record.len() < 2 {
            parsed.errors.push(RowError::new(
                Some(line),
                None,
                RowErrorKind::Malformed,
                "Row has fewer than two cells",
            ));
            continue;
        }

        let row = TaggedRow {
            line,
            section: record[0].trim().to_string(),
            kind: RowKind::from_marker(&record[1]),
            cells: record.iter().skip(2).map(str::to_string).collect(),
        };

        let (next, emitted) = step(state, row);
        state = next;
        match emitted {
            Emitted::Nothing => {}
            Emitted::Block(block) => parsed.blocks.push(block),
            Emitted::Error(err) => {
                debug!("Statement row error: {}", err);
                parsed.errors.push(err);
            }
        }
    }

    if let ScanState::InSection(block) = state {
        parsed.blocks.push(block);
    }

    if parsed.row_count == 0 {
        let reason = last_tokenize_error.unwrap_or_else(|| "no records found".to_string());
        return Err(StatementError::NoRows(reason).into());
    }

    debug!(
        "Parsed statement: {} records, {} blocks, {} row errors",
        parsed.row_count,
        parsed.blocks.len(),
        parsed.errors.len()
    );

    Ok(parsed)
}

/// Strips a UTF-8 BOM and decodes, lossily if needed.
fn decode_content(content: &[u8], errors: &mut Vec<RowError>) -> String {
    let content = content.strip_prefix(UTF8_BOM).unwrap_or(content);

    match std::str::from_utf8(content) {
        Ok(s) => s.to_string(),
        Err(e) => {
            warn!("Statement is not valid UTF-8, decoding lossily");
            errors.push(RowError::new(
                None,
                None,
                RowErrorKind::Encoding,
                format!(
                    "Invalid UTF-8 encoding at byte {}: {}. Some characters may be replaced.",
                    e.valid_up_to(),
                    e
                ),
            ));
            String::from_utf8_lossy(content).into_owned()
        }
    }
}
