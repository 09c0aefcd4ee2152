use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use log::debug;
use std::sync::Arc;

use super::model::{ForexTradeDB, ImportBatchDB, IncomeDB, TradeDB};
use crate::db::{get_connection, WriteHandle};
use crate::errors::{IntoCore, StorageError};
use crate::schema::{forex_trades, import_batches, income, trades};
use ledgerfold_core::errors::{DatabaseError, Error, Result};
use ledgerfold_core::imports::{
    DeletedRows, ImportBatch, ImportCounts, LedgerRecords, LedgerRepositoryTrait, LedgerSnapshot,
    NewImportBatch, RecordedImport,
};

/// SQLite ledger of import batches and the records they inserted.
///
/// Every record is keyed by its import key; inserting a key that is already
/// stored is ignored and counted as skipped.
#[derive(Clone)]
pub struct LedgerRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl LedgerRepository {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

fn not_found(batch_id: &str) -> Error {
    Error::Database(DatabaseError::NotFound(format!("Import batch {}", batch_id)))
}

fn count(rows: usize) -> i64 {
    i64::try_from(rows).unwrap_or(i64::MAX)
}

#[async_trait]
impl LedgerRepositoryTrait for LedgerRepository {
    fn get_batch(&self, batch_id: &str) -> Result<ImportBatch> {
        let mut conn = get_connection(&self.pool)?;
        import_batches::table
            .find(batch_id)
            .select(ImportBatchDB::as_select())
            .first::<ImportBatchDB>(&mut conn)
            .optional()
            .into_core()?
            .map(ImportBatch::from)
            .ok_or_else(|| not_found(batch_id))
    }

    fn list_batches(&self) -> Result<Vec<ImportBatch>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = import_batches::table
            .order((import_batches::created_at.desc(), import_batches::id.desc()))
            .select(ImportBatchDB::as_select())
            .load::<ImportBatchDB>(&mut conn)
            .into_core()?;
        Ok(rows.into_iter().map(ImportBatch::from).collect())
    }

    fn load_ledger(&self) -> Result<LedgerSnapshot> {
        let mut conn = get_connection(&self.pool)?;

        let trade_rows = trades::table
            .inner_join(import_batches::table)
            .order((
                trades::trade_date.asc(),
                import_batches::created_at.asc(),
                import_batches::id.asc(),
                trades::source_row.asc(),
            ))
            .select(TradeDB::as_select())
            .load::<TradeDB>(&mut conn)
            .into_core()?;

        let income_rows = income::table
            .inner_join(import_batches::table)
            .order((
                income::date.asc(),
                import_batches::created_at.asc(),
                income::source_row.asc(),
            ))
            .select(IncomeDB::as_select())
            .load::<IncomeDB>(&mut conn)
            .into_core()?;

        let forex_rows = forex_trades::table
            .inner_join(import_batches::table)
            .order((
                forex_trades::trade_date.asc(),
                import_batches::created_at.asc(),
                forex_trades::source_row.asc(),
            ))
            .select(ForexTradeDB::as_select())
            .load::<ForexTradeDB>(&mut conn)
            .into_core()?;

        let snapshot = LedgerRecords {
            trades: trade_rows
                .into_iter()
                .map(TradeDB::into_record)
                .collect::<std::result::Result<_, StorageError>>()?,
            income: income_rows
                .into_iter()
                .map(IncomeDB::into_record)
                .collect::<std::result::Result<_, StorageError>>()?,
            forex: forex_rows
                .into_iter()
                .map(ForexTradeDB::into_record)
                .collect::<std::result::Result<_, StorageError>>()?,
        };
        debug!(
            "Loaded ledger: {} trades, {} income, {} conversions",
            snapshot.trades.len(),
            snapshot.income.len(),
            snapshot.forex.len()
        );
        Ok(snapshot)
    }

    async fn record_import(
        &self,
        batch: NewImportBatch,
        records: LedgerRecords,
    ) -> Result<RecordedImport> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<RecordedImport> {
                let batch_row = ImportBatchDB {
                    id: batch.id.clone(),
                    filename: batch.filename,
                    period_start: batch.period.map(|p| p.start),
                    period_end: batch.period.map(|p| p.end),
                    trade_count: 0,
                    income_count: 0,
                    fx_count: 0,
                    skipped_count: 0,
                    row_error_count: batch.row_error_count,
                    created_at: Utc::now().naive_utc(),
                };
                diesel::insert_into(import_batches::table)
                    .values(&batch_row)
                    .execute(conn)
                    .map_err(StorageError::from)?;

                let mut counts = ImportCounts::default();
                for trade in &records.trades {
                    let inserted = diesel::insert_or_ignore_into(trades::table)
                        .values(TradeDB::from_record(&batch.id, trade))
                        .execute(conn)
                        .map_err(StorageError::from)?;
                    if inserted > 0 {
                        counts.trades_inserted += 1;
                    } else {
                        counts.trades_skipped += 1;
                    }
                }
                for item in &records.income {
                    let inserted = diesel::insert_or_ignore_into(income::table)
                        .values(IncomeDB::from_record(&batch.id, item))
                        .execute(conn)
                        .map_err(StorageError::from)?;
                    if inserted > 0 {
                        counts.income_inserted += 1;
                    } else {
                        counts.income_skipped += 1;
                    }
                }
                for forex in &records.forex {
                    let inserted = diesel::insert_or_ignore_into(forex_trades::table)
                        .values(ForexTradeDB::from_record(&batch.id, forex))
                        .execute(conn)
                        .map_err(StorageError::from)?;
                    if inserted > 0 {
                        counts.fx_inserted += 1;
                    } else {
                        counts.fx_skipped += 1;
                    }
                }

                diesel::update(import_batches::table.find(&batch.id))
                    .set((
                        import_batches::trade_count.eq(count(counts.trades_inserted)),
                        import_batches::income_count.eq(count(counts.income_inserted)),
                        import_batches::fx_count.eq(count(counts.fx_inserted)),
                        import_batches::skipped_count.eq(count(counts.skipped())),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;

                let stored = import_batches::table
                    .find(&batch.id)
                    .select(ImportBatchDB::as_select())
                    .first::<ImportBatchDB>(conn)
                    .map_err(StorageError::from)?;

                Ok(RecordedImport {
                    batch: stored.into(),
                    counts,
                })
            })
            .await
    }

    async fn delete_batch(&self, batch_id: String) -> Result<DeletedRows> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<DeletedRows> {
                let exists = import_batches::table
                    .find(&batch_id)
                    .select(import_batches::id)
                    .first::<String>(conn)
                    .optional()
                    .map_err(StorageError::from)?
                    .is_some();
                if !exists {
                    return Err(not_found(&batch_id));
                }

                let deleted = DeletedRows {
                    trades: diesel::delete(trades::table.filter(trades::batch_id.eq(&batch_id)))
                        .execute(conn)
                        .map_err(StorageError::from)?,
                    income: diesel::delete(income::table.filter(income::batch_id.eq(&batch_id)))
                        .execute(conn)
                        .map_err(StorageError::from)?,
                    forex: diesel::delete(
                        forex_trades::table.filter(forex_trades::batch_id.eq(&batch_id)),
                    )
                    .execute(conn)
                    .map_err(StorageError::from)?,
                };
                diesel::delete(import_batches::table.find(&batch_id))
                    .execute(conn)
                    .map_err(StorageError::from)?;

                debug!(
                    "Deleted batch {}: {} trades, {} income, {} conversions",
                    batch_id, deleted.trades, deleted.income, deleted.forex
                );
                Ok(deleted)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, run_migrations, spawn_writer};
    use chrono::NaiveDate;
    use ledgerfold_core::trades::{
        compute_forex_key, compute_income_key, compute_trade_key, DateRange, ForexTrade,
        IncomeRecord, IncomeType, TradeAction, TradeRecord,
    };
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    /// Creates a repository over a fresh database in a temp dir.
    /// Returns the temp dir to keep it alive for the test.
    async fn create_test_repository() -> (LedgerRepository, tempfile::TempDir) {
        let temp_dir = tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("ledger.db");
        let db_path_str = db_path.to_string_lossy().to_string();

        crate::db::init(&db_path_str).expect("Failed to init database");
        let pool = create_pool(&db_path_str).expect("Failed to create pool");
        run_migrations(&pool).expect("Failed to run migrations");
        let writer = spawn_writer((*pool).clone());

        (LedgerRepository::new(pool, writer), temp_dir)
    }

    fn d(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, month, day).unwrap()
    }

    fn trade(symbol: &str, date: NaiveDate, action: TradeAction, qty: Decimal, price: Decimal, row: usize) -> TradeRecord {
        TradeRecord {
            trade_date: date,
            settle_date: None,
            symbol: symbol.to_string(),
            asset_class: "Stocks".to_string(),
            action,
            quantity: qty,
            price,
            currency: "SGD".to_string(),
            fx_rate: None,
            realized_pnl: None,
            commission: dec!(1),
            fees: Decimal::ZERO,
            source_row: row,
            import_key: compute_trade_key(date, symbol, action, qty, price, "SGD"),
        }
    }

    fn dividend(symbol: &str, date: NaiveDate, amount: Decimal) -> IncomeRecord {
        let description = format!("{} Cash Dividend", symbol);
        IncomeRecord {
            date,
            symbol: symbol.to_string(),
            income_type: IncomeType::Dividend,
            amount,
            currency: "SGD".to_string(),
            import_key: compute_income_key(date, symbol, IncomeType::Dividend, amount, "SGD", &description),
            description,
            source_row: 9,
        }
    }

    fn conversion(date: NaiveDate, price: Decimal) -> ForexTrade {
        ForexTrade {
            trade_date: date,
            pair: "SGD.HKD".to_string(),
            base_ccy: "SGD".to_string(),
            quote_ccy: "HKD".to_string(),
            quantity: dec!(1000),
            price,
            source_row: 12,
            import_key: compute_forex_key(date, "SGD.HKD", dec!(1000), price),
        }
    }

    fn new_batch(id: &str) -> NewImportBatch {
        NewImportBatch {
            id: id.to_string(),
            filename: format!("{}.csv", id),
            period: Some(DateRange {
                start: d(1, 1),
                end: d(1, 31),
            }),
            row_error_count: 1,
        }
    }

    fn january() -> LedgerRecords {
        LedgerRecords {
            trades: vec![
                trade("D05", d(1, 5), TradeAction::Buy, dec!(100), dec!(35), 3),
                trade("AAPL", d(1, 6), TradeAction::Buy, dec!(10), dec!(100), 4),
            ],
            income: vec![dividend("D05", d(1, 20), dec!(54))],
            forex: vec![conversion(d(1, 5), dec!(6.07482))],
        }
    }

    #[tokio::test]
    async fn test_record_import_inserts_and_counts() {
        let (repo, _temp_dir) = create_test_repository().await;

        let recorded = repo.record_import(new_batch("b1"), january()).await.unwrap();

        assert_eq!(recorded.counts.trades_inserted, 2);
        assert_eq!(recorded.counts.income_inserted, 1);
        assert_eq!(recorded.counts.fx_inserted, 1);
        assert_eq!(recorded.counts.skipped(), 0);
        assert_eq!(recorded.batch.trade_count, 2);
        assert_eq!(recorded.batch.row_error_count, 1);
        assert_eq!(recorded.batch.period_start, Some(d(1, 1)));

        let ledger = repo.load_ledger().unwrap();
        assert_eq!(ledger.trades.len(), 2);
        assert_eq!(ledger.trades[0].symbol, "D05");
        assert_eq!(ledger.forex[0].price, dec!(6.07482));
        assert_eq!(ledger.income[0].amount, dec!(54));
    }

    #[tokio::test]
    async fn test_duplicate_keys_are_skipped() {
        let (repo, _temp_dir) = create_test_repository().await;
        repo.record_import(new_batch("b1"), january()).await.unwrap();

        let again = repo.record_import(new_batch("b2"), january()).await.unwrap();

        assert_eq!(again.counts.inserted(), 0);
        assert_eq!(again.counts.trades_skipped, 2);
        assert_eq!(again.counts.income_skipped, 1);
        assert_eq!(again.counts.fx_skipped, 1);
        assert_eq!(again.batch.skipped_count, 4);
        assert_eq!(repo.load_ledger().unwrap().trades.len(), 2);
        assert_eq!(repo.list_batches().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_batch_removes_only_its_records() {
        let (repo, _temp_dir) = create_test_repository().await;
        repo.record_import(new_batch("b1"), january()).await.unwrap();

        let mut february = january();
        february.trades.push(trade("AAPL", d(2, 3), TradeAction::Sell, dec!(10), dec!(120), 5));
        repo.record_import(new_batch("b2"), february).await.unwrap();
        assert_eq!(repo.load_ledger().unwrap().trades.len(), 3);

        let deleted = repo.delete_batch("b2".to_string()).await.unwrap();

        assert_eq!(deleted.trades, 1);
        assert_eq!(deleted.income, 0);
        assert_eq!(deleted.forex, 0);
        assert_eq!(repo.load_ledger().unwrap(), january());
        assert!(repo.get_batch("b2").is_err());
        assert!(repo.get_batch("b1").is_ok());
    }

    #[tokio::test]
    async fn test_delete_missing_batch_is_not_found() {
        let (repo, _temp_dir) = create_test_repository().await;

        let err = repo.delete_batch("nope".to_string()).await.unwrap_err();

        assert!(matches!(err, Error::Database(DatabaseError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_trades_load_in_date_then_batch_then_row_order() {
        let (repo, _temp_dir) = create_test_repository().await;
        let late = LedgerRecords {
            trades: vec![trade("D05", d(3, 2), TradeAction::Sell, dec!(10), dec!(36), 1)],
            ..Default::default()
        };
        repo.record_import(new_batch("b1"), late).await.unwrap();
        let same_day = LedgerRecords {
            trades: vec![
                trade("D05", d(3, 2), TradeAction::Buy, dec!(20), dec!(34), 7),
                trade("D05", d(3, 1), TradeAction::Buy, dec!(5), dec!(33), 8),
            ],
            ..Default::default()
        };
        repo.record_import(new_batch("b2"), same_day).await.unwrap();

        let trades = repo.load_ledger().unwrap().trades;

        let order: Vec<(NaiveDate, TradeAction)> =
            trades.iter().map(|t| (t.trade_date, t.action)).collect();
        assert_eq!(
            order,
            vec![
                (d(3, 1), TradeAction::Buy),
                (d(3, 2), TradeAction::Sell),
                (d(3, 2), TradeAction::Buy),
            ]
        );
    }

    #[tokio::test]
    async fn test_list_batches_newest_first() {
        let (repo, _temp_dir) = create_test_repository().await;
        repo.record_import(new_batch("b1"), LedgerRecords::default()).await.unwrap();
        repo.record_import(new_batch("b2"), LedgerRecords::default()).await.unwrap();

        let ids: Vec<String> = repo.list_batches().unwrap().into_iter().map(|b| b.id).collect();

        assert_eq!(ids, vec!["b2".to_string(), "b1".to_string()]);
    }
}
