#[cfg(test)]
mod tests {
    use crate::errors::{DatabaseError, Error, Result};
    use crate::imports::{
        DeletedRows, ImportBatch, ImportCounts, ImportService, ImportServiceTrait,
        LedgerRecords, LedgerRepositoryTrait, LedgerSnapshot, NewImportBatch, RecordedImport,
    };
    use crate::pipeline::ImportConfig;
    use crate::portfolio::positions::{Position, PositionStatus};
    use crate::quotes::{ManualQuoteProvider, QuoteUpdate};
    use crate::trades::{ForexTrade, IncomeRecord, TradeRecord};
    use async_trait::async_trait;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use std::sync::{Arc, Mutex};

    // --- In-memory ledger ---
    #[derive(Default)]
    struct MemoryLedger {
        batches: Vec<ImportBatch>,
        trades: Vec<(String, TradeRecord)>,
        income: Vec<(String, IncomeRecord)>,
        forex: Vec<(String, ForexTrade)>,
    }

    #[derive(Default)]
    struct MockLedgerRepository {
        inner: Mutex<MemoryLedger>,
    }

    fn insert_absent<T: Clone>(
        rows: &mut Vec<(String, T)>,
        batch_id: &str,
        records: Vec<T>,
        key: impl Fn(&T) -> &str,
    ) -> (usize, usize) {
        let mut inserted = 0;
        let mut skipped = 0;
        for record in records {
            if rows.iter().any(|(_, existing)| key(existing) == key(&record)) {
                skipped += 1;
            } else {
                rows.push((batch_id.to_string(), record));
                inserted += 1;
            }
        }
        (inserted, skipped)
    }

    #[async_trait]
    impl LedgerRepositoryTrait for MockLedgerRepository {
        fn get_batch(&self, batch_id: &str) -> Result<ImportBatch> {
            let inner = self.inner.lock().unwrap();
            inner
                .batches
                .iter()
                .find(|b| b.id == batch_id)
                .cloned()
                .ok_or_else(|| Error::Database(DatabaseError::NotFound(batch_id.to_string())))
        }

        fn list_batches(&self) -> Result<Vec<ImportBatch>> {
            let inner = self.inner.lock().unwrap();
            Ok(inner.batches.iter().rev().cloned().collect())
        }

        fn load_ledger(&self) -> Result<LedgerSnapshot> {
            let inner = self.inner.lock().unwrap();
            let mut trades: Vec<TradeRecord> = inner.trades.iter().map(|(_, t)| t.clone()).collect();
            trades.sort_by_key(|t| t.trade_date);
            Ok(LedgerRecords {
                trades,
                income: inner.income.iter().map(|(_, i)| i.clone()).collect(),
                forex: inner.forex.iter().map(|(_, f)| f.clone()).collect(),
            })
        }

        async fn record_import(
            &self,
            batch: NewImportBatch,
            records: LedgerRecords,
        ) -> Result<RecordedImport> {
            let mut inner = self.inner.lock().unwrap();
            let (trades_inserted, trades_skipped) =
                insert_absent(&mut inner.trades, &batch.id, records.trades, |t| t.import_key.as_str());
            let (income_inserted, income_skipped) =
                insert_absent(&mut inner.income, &batch.id, records.income, |i| i.import_key.as_str());
            let (fx_inserted, fx_skipped) =
                insert_absent(&mut inner.forex, &batch.id, records.forex, |f| f.import_key.as_str());
            let counts = ImportCounts {
                trades_inserted,
                trades_skipped,
                income_inserted,
                income_skipped,
                fx_inserted,
                fx_skipped,
            };
            let stored = ImportBatch {
                id: batch.id,
                filename: batch.filename,
                period_start: batch.period.map(|p| p.start),
                period_end: batch.period.map(|p| p.end),
                trade_count: trades_inserted as i64,
                income_count: income_inserted as i64,
                fx_count: fx_inserted as i64,
                skipped_count: counts.skipped() as i64,
                row_error_count: batch.row_error_count,
                created_at: Utc::now().naive_utc(),
            };
            inner.batches.push(stored.clone());
            Ok(RecordedImport {
                batch: stored,
                counts,
            })
        }

        async fn delete_batch(&self, batch_id: String) -> Result<DeletedRows> {
            let mut inner = self.inner.lock().unwrap();
            let before = (inner.trades.len(), inner.income.len(), inner.forex.len());
            inner.trades.retain(|(b, _)| *b != batch_id);
            inner.income.retain(|(b, _)| *b != batch_id);
            inner.forex.retain(|(b, _)| *b != batch_id);
            inner.batches.retain(|b| b.id != batch_id);
            Ok(DeletedRows {
                trades: before.0 - inner.trades.len(),
                income: before.1 - inner.income.len(),
                forex: before.2 - inner.forex.len(),
            })
        }
    }

    const HEADER: &str = "Trades,Header,DataDiscriminator,Asset Category,Currency,Symbol,Date/Time,Quantity,T. Price,Proceeds,Comm/Fee,Realized P/L";

    fn january() -> String {
        format!(
            "{}\n\
             Trades,Data,Order,Stocks,SGD,D05,\"2026-01-05, 10:00:00\",100,35,-3500,-5,0\n\
             Trades,Data,Order,Stocks,SGD,AAPL,\"2026-01-06, 10:00:00\",10,100,-1000,-1,0\n\
             Interest,Header,Currency,Date,Description,Amount\n\
             Interest,Data,SGD,2026-01-31,SGD Credit Interest,4.56\n",
            HEADER
        )
    }

    fn february() -> String {
        format!(
            "{}\n\
             Trades,Data,Order,Stocks,SGD,AAPL,\"2026-01-06, 10:00:00\",10,100,-1000,-1,0\n\
             Trades,Data,Order,Stocks,SGD,AAPL,\"2026-02-03, 10:00:00\",-10,120,1200,-1,198\n\
             Trades,Data,Order,Stocks,SGD,MSFT,\"2026-02-04, 10:00:00\",2,400,-800,-1,0\n",
            HEADER
        )
    }

    fn service() -> ImportService {
        ImportService::new(Arc::new(MockLedgerRepository::default()), ImportConfig::default())
    }

    fn find<'a>(positions: &'a [Position], symbol: &str) -> Option<&'a Position> {
        positions.iter().find(|p| p.symbol == symbol)
    }

    #[tokio::test]
    async fn test_import_counts_and_positions() {
        let service = service();

        let result = service.import_statement("jan.csv", january().as_bytes()).await.unwrap();

        assert_eq!(result.counts.trades_inserted, 2);
        assert_eq!(result.counts.income_inserted, 1);
        assert_eq!(result.counts.skipped(), 0);
        assert_eq!(result.batch.trade_count, 2);
        assert_eq!(result.batch.filename, "jan.csv");
        assert!(result.row_errors.is_empty());

        let d05 = find(&result.report.positions, "D05").unwrap();
        assert_eq!(d05.total_cost, dec!(3505));
        assert_eq!(d05.status, PositionStatus::Open);
    }

    #[tokio::test]
    async fn test_reimport_is_idempotent() {
        let service = service();
        service.import_statement("jan.csv", january().as_bytes()).await.unwrap();
        let first = service.get_positions().unwrap();

        let second = service.import_statement("jan.csv", january().as_bytes()).await.unwrap();

        assert_eq!(second.counts.trades_inserted, 0);
        assert_eq!(second.counts.trades_skipped, 2);
        assert_eq!(second.counts.income_skipped, 1);
        assert_eq!(second.batch.skipped_count, 3);
        assert_eq!(second.report.positions, first.positions);
        assert_eq!(service.list_batches().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_overlapping_statement_only_adds_new_trades() {
        let service = service();
        service.import_statement("jan.csv", january().as_bytes()).await.unwrap();

        let result = service.import_statement("feb.csv", february().as_bytes()).await.unwrap();

        assert_eq!(result.counts.trades_inserted, 2);
        assert_eq!(result.counts.trades_skipped, 1);
        let aapl = find(&result.report.positions, "AAPL").unwrap();
        assert_eq!(aapl.status, PositionStatus::Closed);
        assert_eq!(aapl.realized_pnl, dec!(198));
    }

    #[tokio::test]
    async fn test_delete_batch_restores_previous_positions() {
        let service = service();
        service.import_statement("jan.csv", january().as_bytes()).await.unwrap();
        let before = service.get_positions().unwrap();

        let feb = service.import_statement("feb.csv", february().as_bytes()).await.unwrap();
        let deleted = service.delete_batch(&feb.batch.id).await.unwrap();

        assert_eq!(deleted.deleted.trades, 2);
        assert_eq!(deleted.report.positions, before.positions);
        assert!(find(&deleted.report.positions, "MSFT").is_none());
        assert!(service.get_batch(&feb.batch.id).is_err());
    }

    #[tokio::test]
    async fn test_delete_unknown_batch_is_not_found() {
        let service = service();
        let err = service.delete_batch("missing").await.unwrap_err();
        assert!(matches!(err, Error::Database(DatabaseError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_preview_does_not_persist() {
        let service = service();
        service.import_statement("jan.csv", january().as_bytes()).await.unwrap();

        let preview = service.preview_statement("feb.csv", february().as_bytes()).unwrap();

        assert_eq!(preview.trades.len(), 3);
        assert_eq!(preview.duplicate_count, 1);
        assert_eq!(service.list_batches().unwrap().len(), 1);
        assert!(find(&service.get_positions().unwrap().positions, "MSFT").is_none());
    }

    #[tokio::test]
    async fn test_fatal_parse_error_records_nothing() {
        let service = service();
        let err = service.import_statement("empty.csv", b"").await.unwrap_err();
        assert!(matches!(err, Error::Statement(_)));
        assert!(service.list_batches().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_income_summary_and_valuation() {
        let service = service();
        service.import_statement("jan.csv", january().as_bytes()).await.unwrap();

        let income = service.get_income_summary().unwrap();
        assert_eq!(income.interest_base, dec!(4.56));

        let provider = ManualQuoteProvider::new();
        provider
            .set_quote(
                "D05",
                QuoteUpdate {
                    price: dec!(36),
                    day_change: None,
                },
            )
            .unwrap();
        let valuation = service.get_valuation(&provider).await.unwrap();
        assert_eq!(valuation.total_market_value_base, dec!(3600));
        assert_eq!(valuation.unvalued_count, 1);
    }
}
