use async_trait::async_trait;

use super::imports_model::*;
use crate::fx::FxObservation;
use crate::portfolio::income::IncomeSummary;
use crate::portfolio::valuation::PortfolioValuation;
use crate::quotes::QuoteProviderTrait;
use crate::Result;

/// Trait defining the contract for ledger persistence.
///
/// Records are keyed by their `import_key`; inserting an existing key is a
/// no-op counted as skipped. Uniqueness is enforced by the store.
#[async_trait]
pub trait LedgerRepositoryTrait: Send + Sync {
    fn get_batch(&self, batch_id: &str) -> Result<ImportBatch>;
    /// Batches newest first.
    fn list_batches(&self) -> Result<Vec<ImportBatch>>;
    /// All stored records. Trades ordered by trade date, batch creation and source row.
    fn load_ledger(&self) -> Result<LedgerSnapshot>;
    /// Creates the batch and inserts its absent records in one transaction.
    async fn record_import(
        &self,
        batch: NewImportBatch,
        records: LedgerRecords,
    ) -> Result<RecordedImport>;
    /// Removes the batch and exactly the records it inserted.
    async fn delete_batch(&self, batch_id: String) -> Result<DeletedRows>;
}

/// Trait defining the contract for statement import operations.
#[async_trait]
pub trait ImportServiceTrait: Send + Sync {
    fn base_currency(&self) -> &str;
    fn preview_statement(&self, filename: &str, content: &[u8]) -> Result<StatementPreview>;
    async fn import_statement(&self, filename: &str, content: &[u8]) -> Result<ImportResult>;
    async fn delete_batch(&self, batch_id: &str) -> Result<DeleteBatchResult>;
    fn list_batches(&self) -> Result<Vec<ImportBatch>>;
    fn get_batch(&self, batch_id: &str) -> Result<ImportBatch>;
    fn get_positions(&self) -> Result<PositionsReport>;
    fn get_fx_rates(&self) -> Result<Vec<FxObservation>>;
    fn get_income_summary(&self) -> Result<IncomeSummary>;
    async fn get_valuation(&self, provider: &dyn QuoteProviderTrait) -> Result<PortfolioValuation>;
}
