use async_trait::async_trait;
use log::{debug, info};
use std::collections::HashSet;
use std::sync::Arc;

use super::imports_model::*;
use super::imports_traits::{ImportServiceTrait, LedgerRepositoryTrait};
use crate::fx::FxObservation;
use crate::pipeline::{reconstruct, run_pipeline, ImportConfig, Reconstruction};
use crate::portfolio::income::{summarize_income, IncomeSummary};
use crate::portfolio::valuation::{value_positions, PortfolioValuation};
use crate::quotes::QuoteProviderTrait;
use crate::Result;

/// Imports statements into the ledger and rebuilds positions from it.
pub struct ImportService {
    repository: Arc<dyn LedgerRepositoryTrait>,
    config: ImportConfig,
}

impl ImportService {
    pub fn new(repository: Arc<dyn LedgerRepositoryTrait>, config: ImportConfig) -> Self {
        Self { repository, config }
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// Resolves rates and folds positions over everything stored.
    fn rebuild(&self) -> Result<(LedgerSnapshot, Reconstruction)> {
        let ledger = self.repository.load_ledger()?;
        let reconstruction = reconstruct(&ledger.trades, &ledger.income, &ledger.forex, &self.config);
        Ok((ledger, reconstruction))
    }

    fn report(&self, reconstruction: Reconstruction) -> PositionsReport {
        PositionsReport {
            base_currency: self.config.base_currency.clone(),
            fx_rates: reconstruction.fx.table.observations().cloned().collect(),
            fx_warnings: reconstruction.fx.warnings,
            positions: reconstruction.positions.positions,
            clamp_warnings: reconstruction.positions.warnings,
        }
    }

    fn existing_keys(&self) -> Result<HashSet<String>> {
        let ledger = self.repository.load_ledger()?;
        Ok(ledger
            .trades
            .into_iter()
            .map(|t| t.import_key)
            .chain(ledger.income.into_iter().map(|i| i.import_key))
            .chain(ledger.forex.into_iter().map(|f| f.import_key))
            .collect())
    }
}

#[async_trait]
impl ImportServiceTrait for ImportService {
    fn base_currency(&self) -> &str {
        &self.config.base_currency
    }

    fn preview_statement(&self, filename: &str, content: &[u8]) -> Result<StatementPreview> {
        let run = run_pipeline(content, &self.config)?;
        let existing = self.existing_keys()?;
        let statement = run.statement;

        let duplicate_count = statement
            .trades
            .iter()
            .map(|t| &t.import_key)
            .chain(statement.income.iter().map(|i| &i.import_key))
            .chain(statement.forex.iter().map(|f| &f.import_key))
            .filter(|key| existing.contains(*key))
            .count();
        let income_summary = summarize_income(&statement.income, &run.reconstruction.fx.table);
        debug!(
            "Previewed {}: {} records, {} already imported",
            filename,
            statement.trades.len() + statement.income.len() + statement.forex.len(),
            duplicate_count
        );

        Ok(StatementPreview {
            filename: filename.to_string(),
            metadata: statement.metadata,
            period: statement.period,
            trades: statement.trades,
            income: statement.income,
            forex: statement.forex,
            row_errors: statement.errors,
            duplicate_count,
            report: self.report(run.reconstruction),
            income_summary,
        })
    }

    async fn import_statement(&self, filename: &str, content: &[u8]) -> Result<ImportResult> {
        let run = run_pipeline(content, &self.config)?;
        let statement = run.statement;

        let new_batch = NewImportBatch {
            id: uuid::Uuid::now_v7().to_string(),
            filename: filename.to_string(),
            period: statement.period,
            row_error_count: statement.errors.len() as i64,
        };
        let records = LedgerRecords {
            trades: statement.trades,
            income: statement.income,
            forex: statement.forex,
        };

        let recorded = self.repository.record_import(new_batch, records).await?;
        info!(
            "Imported {} as batch {}: {} inserted, {} duplicates skipped, {} row errors",
            filename,
            recorded.batch.id,
            recorded.counts.inserted(),
            recorded.counts.skipped(),
            statement.errors.len()
        );

        let (_, reconstruction) = self.rebuild()?;
        Ok(ImportResult {
            batch: recorded.batch,
            counts: recorded.counts,
            row_errors: statement.errors,
            metadata: statement.metadata,
            report: self.report(reconstruction),
        })
    }

    async fn delete_batch(&self, batch_id: &str) -> Result<DeleteBatchResult> {
        let batch = self.repository.get_batch(batch_id)?;
        let deleted = self.repository.delete_batch(batch_id.to_string()).await?;
        info!(
            "Deleted batch {} ({}): {} trades, {} income, {} conversions",
            batch.id, batch.filename, deleted.trades, deleted.income, deleted.forex
        );

        let (_, reconstruction) = self.rebuild()?;
        Ok(DeleteBatchResult {
            batch,
            deleted,
            report: self.report(reconstruction),
        })
    }

    fn list_batches(&self) -> Result<Vec<ImportBatch>> {
        self.repository.list_batches()
    }

    fn get_batch(&self, batch_id: &str) -> Result<ImportBatch> {
        self.repository.get_batch(batch_id)
    }

    fn get_positions(&self) -> Result<PositionsReport> {
        let (_, reconstruction) = self.rebuild()?;
        Ok(self.report(reconstruction))
    }

    fn get_fx_rates(&self) -> Result<Vec<FxObservation>> {
        let (_, reconstruction) = self.rebuild()?;
        Ok(reconstruction.fx.table.observations().cloned().collect())
    }

    fn get_income_summary(&self) -> Result<IncomeSummary> {
        let (ledger, reconstruction) = self.rebuild()?;
        Ok(summarize_income(&ledger.income, &reconstruction.fx.table))
    }

    async fn get_valuation(&self, provider: &dyn QuoteProviderTrait) -> Result<PortfolioValuation> {
        let (_, reconstruction) = self.rebuild()?;
        Ok(value_positions(
            &reconstruction.positions.positions,
            &reconstruction.fx.table,
            provider,
        )
        .await)
    }
}
