//! Database models for import batches and ledger records.

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::errors::StorageError;
use ledgerfold_core::imports::ImportBatch;
use ledgerfold_core::trades::{ForexTrade, IncomeRecord, TradeRecord};

/// Database model for import batches
#[derive(Queryable, Identifiable, Selectable, Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::import_batches)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ImportBatchDB {
    pub id: String,
    pub filename: String,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub trade_count: i64,
    pub income_count: i64,
    pub fx_count: i64,
    pub skipped_count: i64,
    pub row_error_count: i64,
    pub created_at: NaiveDateTime,
}

impl From<ImportBatchDB> for ImportBatch {
    fn from(db: ImportBatchDB) -> Self {
        Self {
            id: db.id,
            filename: db.filename,
            period_start: db.period_start,
            period_end: db.period_end,
            trade_count: db.trade_count,
            income_count: db.income_count,
            fx_count: db.fx_count,
            skipped_count: db.skipped_count,
            row_error_count: db.row_error_count,
            created_at: db.created_at,
        }
    }
}

/// Database model for trades
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::trades)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TradeDB {
    pub import_key: String,
    pub batch_id: String,
    pub trade_date: NaiveDate,
    pub settle_date: Option<NaiveDate>,
    pub symbol: String,
    pub asset_class: String,
    pub action: String,
    pub quantity: String,
    pub price: String,
    pub currency: String,
    pub fx_rate: Option<String>,
    pub realized_pnl: Option<String>,
    pub commission: String,
    pub fees: String,
    pub source_row: i32,
}

/// Database model for income rows
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::income)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct IncomeDB {
    pub import_key: String,
    pub batch_id: String,
    pub date: NaiveDate,
    pub symbol: String,
    pub income_type: String,
    pub amount: String,
    pub currency: String,
    pub description: String,
    pub source_row: i32,
}

/// Database model for currency conversions
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::forex_trades)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ForexTradeDB {
    pub import_key: String,
    pub batch_id: String,
    pub trade_date: NaiveDate,
    pub pair: String,
    pub base_ccy: String,
    pub quote_ccy: String,
    pub quantity: String,
    pub price: String,
    pub source_row: i32,
}

fn parse_decimal(column: &str, value: &str) -> Result<Decimal, StorageError> {
    Decimal::from_str(value)
        .map_err(|e| StorageError::InvalidValue(format!("{} '{}': {}", column, value, e)))
}

fn parse_optional_decimal(column: &str, value: Option<&str>) -> Result<Option<Decimal>, StorageError> {
    value.map(|v| parse_decimal(column, v)).transpose()
}

fn row_number(source_row: usize) -> i32 {
    i32::try_from(source_row).unwrap_or(i32::MAX)
}

fn source_row(stored: i32) -> usize {
    usize::try_from(stored).unwrap_or_default()
}

impl TradeDB {
    pub fn from_record(batch_id: &str, trade: &TradeRecord) -> Self {
        Self {
            import_key: trade.import_key.clone(),
            batch_id: batch_id.to_string(),
            trade_date: trade.trade_date,
            settle_date: trade.settle_date,
            symbol: trade.symbol.clone(),
            asset_class: trade.asset_class.clone(),
            action: trade.action.as_str().to_string(),
            quantity: trade.quantity.to_string(),
            price: trade.price.to_string(),
            currency: trade.currency.clone(),
            fx_rate: trade.fx_rate.map(|r| r.to_string()),
            realized_pnl: trade.realized_pnl.map(|p| p.to_string()),
            commission: trade.commission.to_string(),
            fees: trade.fees.to_string(),
            source_row: row_number(trade.source_row),
        }
    }

    pub fn into_record(self) -> Result<TradeRecord, StorageError> {
        Ok(TradeRecord {
            trade_date: self.trade_date,
            settle_date: self.settle_date,
            action: self.action.parse()?,
            quantity: parse_decimal("quantity", &self.quantity)?,
            price: parse_decimal("price", &self.price)?,
            fx_rate: parse_optional_decimal("fx_rate", self.fx_rate.as_deref())?,
            realized_pnl: parse_optional_decimal("realized_pnl", self.realized_pnl.as_deref())?,
            commission: parse_decimal("commission", &self.commission)?,
            fees: parse_decimal("fees", &self.fees)?,
            source_row: source_row(self.source_row),
            symbol: self.symbol,
            asset_class: self.asset_class,
            currency: self.currency,
            import_key: self.import_key,
        })
    }
}

impl IncomeDB {
    pub fn from_record(batch_id: &str, income: &IncomeRecord) -> Self {
        Self {
            import_key: income.import_key.clone(),
            batch_id: batch_id.to_string(),
            date: income.date,
            symbol: income.symbol.clone(),
            income_type: income.income_type.as_str().to_string(),
            amount: income.amount.to_string(),
            currency: income.currency.clone(),
            description: income.description.clone(),
            source_row: row_number(income.source_row),
        }
    }

    pub fn into_record(self) -> Result<IncomeRecord, StorageError> {
        Ok(IncomeRecord {
            date: self.date,
            income_type: self.income_type.parse()?,
            amount: parse_decimal("amount", &self.amount)?,
            source_row: source_row(self.source_row),
            symbol: self.symbol,
            currency: self.currency,
            description: self.description,
            import_key: self.import_key,
        })
    }
}

impl ForexTradeDB {
    pub fn from_record(batch_id: &str, forex: &ForexTrade) -> Self {
        Self {
            import_key: forex.import_key.clone(),
            batch_id: batch_id.to_string(),
            trade_date: forex.trade_date,
            pair: forex.pair.clone(),
            base_ccy: forex.base_ccy.clone(),
            quote_ccy: forex.quote_ccy.clone(),
            quantity: forex.quantity.to_string(),
            price: forex.price.to_string(),
            source_row: row_number(forex.source_row),
        }
    }

    pub fn into_record(self) -> Result<ForexTrade, StorageError> {
        Ok(ForexTrade {
            trade_date: self.trade_date,
            quantity: parse_decimal("quantity", &self.quantity)?,
            price: parse_decimal("price", &self.price)?,
            source_row: source_row(self.source_row),
            pair: self.pair,
            base_ccy: self.base_ccy,
            quote_ccy: self.quote_ccy,
            import_key: self.import_key,
        })
    }
}
