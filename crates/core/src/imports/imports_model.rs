use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::fx::{FxFallbackWarning, FxObservation};
use crate::portfolio::income::IncomeSummary;
use crate::portfolio::positions::{ClampWarning, Position};
use crate::statement::{RowError, StatementMetadata};
use crate::trades::{DateRange, ForexTrade, IncomeRecord, TradeRecord};

/// One uploaded statement file and what it contributed to the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportBatch {
    pub id: String,
    pub filename: String,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    /// Trades inserted by this batch
    pub trade_count: i64,
    pub income_count: i64,
    pub fx_count: i64,
    /// Records already present from an earlier import
    pub skipped_count: i64,
    pub row_error_count: i64,
    pub created_at: NaiveDateTime,
}

/// Batch header handed to the repository before counts are known.
#[derive(Debug, Clone, PartialEq)]
pub struct NewImportBatch {
    pub id: String,
    pub filename: String,
    pub period: Option<DateRange>,
    pub row_error_count: i64,
}

/// Records of one statement to be inserted if absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerRecords {
    pub trades: Vec<TradeRecord>,
    pub income: Vec<IncomeRecord>,
    pub forex: Vec<ForexTrade>,
}

impl LedgerRecords {
    pub fn len(&self) -> usize {
        self.trades.len() + self.income.len() + self.forex.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Everything currently stored, in fold order.
pub type LedgerSnapshot = LedgerRecords;

/// Inserted versus duplicate counts per record kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportCounts {
    pub trades_inserted: usize,
    pub trades_skipped: usize,
    pub income_inserted: usize,
    pub income_skipped: usize,
    pub fx_inserted: usize,
    pub fx_skipped: usize,
}

impl ImportCounts {
    pub fn inserted(&self) -> usize {
        self.trades_inserted + self.income_inserted + self.fx_inserted
    }

    pub fn skipped(&self) -> usize {
        self.trades_skipped + self.income_skipped + self.fx_skipped
    }
}

/// What the repository reports after recording a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedImport {
    pub batch: ImportBatch,
    pub counts: ImportCounts,
}

/// Rows removed with a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedRows {
    pub trades: usize,
    pub income: usize,
    pub forex: usize,
}

/// Positions with the FX provenance and warnings behind them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionsReport {
    pub base_currency: String,
    pub positions: Vec<Position>,
    pub clamp_warnings: Vec<ClampWarning>,
    pub fx_warnings: Vec<FxFallbackWarning>,
    pub fx_rates: Vec<FxObservation>,
}

/// Result of importing a statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub batch: ImportBatch,
    pub counts: ImportCounts,
    pub row_errors: Vec<RowError>,
    pub metadata: StatementMetadata,
    /// Positions over the whole ledger after the import
    pub report: PositionsReport,
}

/// A statement run through the pipeline without being stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementPreview {
    pub filename: String,
    pub metadata: StatementMetadata,
    pub period: Option<DateRange>,
    pub trades: Vec<TradeRecord>,
    pub income: Vec<IncomeRecord>,
    pub forex: Vec<ForexTrade>,
    pub row_errors: Vec<RowError>,
    /// Records of this file already present in the ledger
    pub duplicate_count: usize,
    /// Positions from this file alone
    pub report: PositionsReport,
    pub income_summary: IncomeSummary,
}

/// Result of deleting a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteBatchResult {
    pub batch: ImportBatch,
    pub deleted: DeletedRows,
    /// Positions over the remaining ledger
    pub report: PositionsReport,
}
