//! Converts parsed section rows into canonical records.

use log::{debug, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::columns::Column;
use super::statement_model::{
    HeaderIndex, ParsedStatement, RawRow, RowError, RowErrorKind, SectionKind,
};
use super::values::{normalize_symbol, parse_decimal, parse_forex_pair, parse_period, parse_trade_date};
use crate::constants::CASH_SYMBOL;
use crate::trades::{
    compute_forex_key, compute_income_key, compute_trade_key, DateRange, ForexTrade,
    IncomeRecord, IncomeType, TradeAction, TradeRecord,
};

/// Trade row discriminators that describe an execution.
const EXECUTION_DISCRIMINATORS: &[&str] = &["order", "trade", "execution"];

/// Free-text fields of the `Statement` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementMetadata {
    pub broker_name: Option<String>,
    pub title: Option<String>,
    pub when_generated: Option<String>,
    /// Period text exactly as printed
    pub period: Option<String>,
}

/// Normalizer output.
#[derive(Debug, Clone, Default)]
pub struct NormalizedStatement {
    pub trades: Vec<TradeRecord>,
    pub income: Vec<IncomeRecord>,
    pub forex: Vec<ForexTrade>,
    pub metadata: StatementMetadata,
    /// Statement period, or the span of record dates when no period was printed
    pub period: Option<DateRange>,
    /// Parser and normalizer row errors, in that order
    pub errors: Vec<RowError>,
    /// Rows intentionally passed over (totals, closed-lot detail lines)
    pub ignored_rows: usize,
}

/// Outcome of normalizing one trades row.
enum TradeRow {
    Security(TradeRecord),
    Forex(ForexTrade),
    Ignored,
}

type RowResult<T> = std::result::Result<T, RowError>;

/// Normalizes every block of a parsed statement.
pub fn normalize_statement(parsed: &ParsedStatement) -> NormalizedStatement {
    let mut out = NormalizedStatement {
        errors: parsed.errors.clone(),
        ..Default::default()
    };

    for block in &parsed.blocks {
        for row in &block.rows {
            match block.section {
                SectionKind::Trades => match normalize_trade_row(&block.header, row) {
                    Ok(TradeRow::Security(trade)) => out.trades.push(trade),
                    Ok(TradeRow::Forex(fx)) => out.forex.push(fx),
                    Ok(TradeRow::Ignored) => out.ignored_rows += 1,
                    Err(err) => record_error(&mut out.errors, err),
                },
                SectionKind::Dividends | SectionKind::Interest => {
                    match normalize_income_row(block.section, &block.header, row) {
                        Ok(Some(income)) => out.income.push(income),
                        Ok(None) => out.ignored_rows += 1,
                        Err(err) => record_error(&mut out.errors, err),
                    }
                }
                SectionKind::Statement => apply_statement_field(&mut out.metadata, &block.header, row),
            }
        }
    }

    out.period = out
        .metadata
        .period
        .as_deref()
        .and_then(parse_period)
        .or_else(|| {
            DateRange::covering(
                out.trades
                    .iter()
                    .map(|t| t.trade_date)
                    .chain(out.income.iter().map(|i| i.date))
                    .chain(out.forex.iter().map(|f| f.trade_date)),
            )
        });

    debug!(
        "Normalized statement: {} trades, {} income, {} forex, {} errors, {} ignored",
        out.trades.len(),
        out.income.len(),
        out.forex.len(),
        out.errors.len(),
        out.ignored_rows
    );

    out
}

fn record_error(errors: &mut Vec<RowError>, err: RowError) {
    warn!("Skipping statement row: {}", err);
    errors.push(err);
}

fn normalize_trade_row(header: &HeaderIndex, row: &RawRow) -> RowResult<TradeRow> {
    let section = SectionKind::Trades;
    let discriminator = header.value(row, Column::Discriminator);
    if !discriminator.is_empty()
        && !EXECUTION_DISCRIMINATORS
            .iter()
            .any(|d| discriminator.eq_ignore_ascii_case(d))
    {
        debug!("Ignoring {} trade row at line {}", discriminator, row.line);
        return Ok(TradeRow::Ignored);
    }

    let raw_symbol = header.value(row, Column::Symbol);
    let asset_class = header.value(row, Column::AssetCategory);
    let is_forex_category = asset_class.to_lowercase().contains("forex")
        || asset_class.eq_ignore_ascii_case("cash");

    let trade_date = required_date(header, row, section, Column::TradeDate)?;
    let quantity = required_decimal(header, row, section, Column::Quantity)?;
    if quantity.is_zero() {
        return Err(RowError::at(
            row.line,
            section,
            RowErrorKind::ZeroQuantity,
            "Trade quantity is zero",
        ));
    }
    let price = required_decimal(header, row, section, Column::Price)?;
    if price.is_sign_negative() && !price.is_zero() {
        return Err(RowError::at(
            row.line,
            section,
            RowErrorKind::InvalidNumber,
            format!("Trade price {} is negative", price),
        ));
    }

    if let Some((base_ccy, quote_ccy)) = parse_forex_pair(raw_symbol) {
        let pair = format!("{}.{}", base_ccy, quote_ccy);
        let quantity = quantity.abs();
        return Ok(TradeRow::Forex(ForexTrade {
            import_key: compute_forex_key(trade_date, &pair, quantity, price),
            trade_date,
            pair,
            base_ccy,
            quote_ccy,
            quantity,
            price,
            source_row: row.line,
        }));
    }
    if is_forex_category {
        return Err(RowError::at(
            row.line,
            section,
            RowErrorKind::MissingField,
            format!("Forex row without a currency pair symbol '{}'", raw_symbol),
        ));
    }

    let symbol = normalize_symbol(raw_symbol);
    if symbol.is_empty() {
        return Err(missing(row, section, Column::Symbol));
    }
    let currency = required_text(header, row, section, Column::Currency)?.to_uppercase();

    let action = if quantity.is_sign_positive() {
        TradeAction::Buy
    } else {
        TradeAction::Sell
    };
    let quantity = quantity.abs();

    let settle_date = parse_trade_date(header.value(row, Column::SettleDate));
    let fx_rate = optional_decimal(header, row, Column::FxRate);
    // A zero realized figure is what brokers print on opening trades
    let realized_pnl = optional_decimal(header, row, Column::RealizedPnl).filter(|v| !v.is_zero());
    let commission = optional_decimal(header, row, Column::Commission)
        .unwrap_or_default()
        .abs();
    let fees = optional_decimal(header, row, Column::Fees)
        .unwrap_or_default()
        .abs();
    let cost = quantity
        .checked_mul(price)
        .zip(commission.checked_add(fees))
        .and_then(|(gross, charges)| gross.checked_add(charges));
    if cost.is_none() {
        return Err(RowError::at(
            row.line,
            section,
            RowErrorKind::InvalidNumber,
            format!("Trade amount {} x {} is out of range", quantity, price),
        ));
    }

    Ok(TradeRow::Security(TradeRecord {
        import_key: compute_trade_key(trade_date, &symbol, action, quantity, price, &currency),
        trade_date,
        settle_date,
        symbol,
        asset_class: if asset_class.is_empty() {
            "Unknown".to_string()
        } else {
            asset_class.to_string()
        },
        action,
        quantity,
        price,
        currency,
        fx_rate,
        realized_pnl,
        commission,
        fees,
        source_row: row.line,
    }))
}

fn normalize_income_row(
    section: SectionKind,
    header: &HeaderIndex,
    row: &RawRow,
) -> RowResult<Option<IncomeRecord>> {
    let currency = header.value(row, Column::Currency);
    let description = header.value(row, Column::Description);
    if is_total_marker(currency) || is_total_marker(header.value(row, Column::Date)) {
        return Ok(None);
    }

    let date = required_date(header, row, section, Column::Date)?;
    let amount = required_decimal(header, row, section, Column::Amount)?;
    let currency = required_text(header, row, section, Column::Currency)?.to_uppercase();

    let (symbol, income_type) = match section {
        SectionKind::Interest => (CASH_SYMBOL.to_string(), IncomeType::Interest),
        _ => {
            let symbol = dividend_symbol(description);
            if symbol.is_empty() {
                return Err(RowError::at(
                    row.line,
                    section,
                    RowErrorKind::MissingField,
                    "Dividend description does not name a symbol",
                ));
            }
            (symbol, classify_dividend(description))
        }
    };

    Ok(Some(IncomeRecord {
        import_key: compute_income_key(date, &symbol, income_type, amount, &currency, description),
        date,
        symbol,
        income_type,
        amount,
        currency,
        description: description.to_string(),
        source_row: row.line,
    }))
}

fn apply_statement_field(metadata: &mut StatementMetadata, header: &HeaderIndex, row: &RawRow) {
    let name = header.value(row, Column::FieldName);
    let value = header.value(row, Column::FieldValue);
    if value.is_empty() {
        return;
    }
    let slot = match name.to_lowercase().replace(' ', "").as_str() {
        "period" => &mut metadata.period,
        "brokername" => &mut metadata.broker_name,
        "title" => &mut metadata.title,
        "whengenerated" => &mut metadata.when_generated,
        _ => return,
    };
    *slot = Some(value.to_string());
}

fn is_total_marker(value: &str) -> bool {
    value.to_lowercase().starts_with("total")
}

/// Token before the first `(` or space of a dividend description.
fn dividend_symbol(description: &str) -> String {
    let token = description
        .split(|c: char| c == '(' || c.is_whitespace())
        .next()
        .unwrap_or("");
    normalize_symbol(token)
}

fn classify_dividend(description: &str) -> IncomeType {
    let lower = description.to_lowercase();
    if lower.contains("payment in lieu") {
        IncomeType::Other
    } else {
        IncomeType::Dividend
    }
}

fn missing(row: &RawRow, section: SectionKind, column: Column) -> RowError {
    RowError::at(
        row.line,
        section,
        RowErrorKind::MissingField,
        format!("Missing {:?} value", column),
    )
}

fn required_text<'r>(
    header: &HeaderIndex,
    row: &'r RawRow,
    section: SectionKind,
    column: Column,
) -> RowResult<&'r str> {
    let value = header.value(row, column);
    if value.is_empty() {
        Err(missing(row, section, column))
    } else {
        Ok(value)
    }
}

fn required_date(
    header: &HeaderIndex,
    row: &RawRow,
    section: SectionKind,
    column: Column,
) -> RowResult<chrono::NaiveDate> {
    let raw = required_text(header, row, section, column)?;
    parse_trade_date(raw).ok_or_else(|| {
        RowError::at(
            row.line,
            section,
            RowErrorKind::InvalidDate,
            format!("Unrecognized date '{}'", raw),
        )
    })
}

fn required_decimal(
    header: &HeaderIndex,
    row: &RawRow,
    section: SectionKind,
    column: Column,
) -> RowResult<Decimal> {
    let raw = header.value(row, column);
    match parse_decimal(raw) {
        Ok(Some(value)) => Ok(value),
        Ok(None) => Err(missing(row, section, column)),
        Err(e) => Err(RowError::at(
            row.line,
            section,
            RowErrorKind::InvalidNumber,
            format!("Invalid {:?} '{}': {}", column, raw, e),
        )),
    }
}

fn optional_decimal(header: &HeaderIndex, row: &RawRow, column: Column) -> Option<Decimal> {
    let raw = header.value(row, column);
    match parse_decimal(raw) {
        Ok(value) => value,
        Err(e) => {
            debug!(
                "Ignoring unparseable {:?} '{}' at line {}: {}",
                column, raw, row.line, e
            );
            None
        }
    }
}
