//! Cell value parsing shared by the normalizer.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::trades::DateRange;

/// Free-form date layouts accepted after the ISO fast path.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d-%b-%Y",
    "%d-%B-%Y",
    "%Y/%m/%d",
];

/// Parses a statement date to a calendar day.
///
/// Accepts `YYYY-MM-DD` optionally followed by `, HH:MM:SS` (or any time
/// part), `YYYYMMDD`, `MM/DD/YYYY`, `January 20, 2026`, `20-Jan-2026` and
/// `2026/01/20`.
pub fn parse_trade_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Some(date) = parse_iso_prefix(value) {
        return Some(date);
    }
    if let Some(date) = parse_compact(value) {
        return Some(date);
    }
    if let Some(date) = parse_with_formats(value) {
        return Some(date);
    }

    // "01/20/2026, 10:15:00" and the like
    value
        .split_once(',')
        .and_then(|(head, _)| parse_compact(head.trim()).or_else(|| parse_with_formats(head.trim())))
}

fn parse_iso_prefix(value: &str) -> Option<NaiveDate> {
    let prefix = value.get(..10)?;
    let rest = value.get(10..)?;
    if !(rest.is_empty() || rest.starts_with(',') || rest.starts_with(' ') || rest.starts_with('T')) {
        return None;
    }
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

fn parse_compact(value: &str) -> Option<NaiveDate> {
    if value.len() != 8 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year = value[..4].parse().ok()?;
    let month = value[4..6].parse().ok()?;
    let day = value[6..].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_with_formats(value: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

/// Parses a statement number.
///
/// Thousands separators are removed, `(12.50)` is negative, and empty cells
/// or `--` are absent (`Ok(None)`).
pub fn parse_decimal(value: &str) -> Result<Option<Decimal>, rust_decimal::Error> {
    let value = value.trim();
    if value.is_empty() || value == "--" {
        return Ok(None);
    }

    let (negative, body) = match value.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, value),
    };
    let cleaned: String = body
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() || cleaned == "--" {
        return Ok(None);
    }

    let parsed = Decimal::from_str(&cleaned).or_else(|_| Decimal::from_scientific(&cleaned))?;
    Ok(Some(if negative { -parsed } else { parsed }))
}

/// Canonical symbol: text before the first `.`, uppercased.
pub fn normalize_symbol(raw: &str) -> String {
    let raw = raw.trim();
    let head = raw.split('.').next().unwrap_or(raw);
    head.trim().to_uppercase()
}

/// Splits a currency pair symbol such as `SGD.HKD`.
///
/// Both sides must be three ASCII letters.
pub fn parse_forex_pair(raw: &str) -> Option<(String, String)> {
    let (left, right) = raw.trim().split_once('.')?;
    if is_currency_code(left) && is_currency_code(right) {
        Some((left.to_uppercase(), right.to_uppercase()))
    } else {
        None
    }
}

fn is_currency_code(s: &str) -> bool {
    s.len() == 3 && s.bytes().all(|b| b.is_ascii_alphabetic())
}

/// Parses a statement period such as `January 1, 2026 - January 31, 2026`.
///
/// A single date yields a one-day range.
pub fn parse_period(value: &str) -> Option<DateRange> {
    let value = value.replace(['\u{2013}', '\u{2014}'], "-");
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    match value.split_once(" - ") {
        Some((start, end)) => {
            let start = parse_trade_date(start)?;
            let end = parse_trade_date(end)?;
            Some(DateRange {
                start: start.min(end),
                end: start.max(end),
            })
        }
        None => parse_trade_date(value).map(|d| DateRange { start: d, end: d }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_parse_trade_date_formats() {
        let expected = d(2026, 1, 20);
        for input in [
            "2026-01-20",
            "2026-01-20, 10:15:00",
            "2026-01-20 10:15:00",
            "20260120",
            "01/20/2026",
            "January 20, 2026",
            "Jan 20, 2026",
            "20-Jan-2026",
            "2026/01/20",
            "01/20/2026, 09:30:00",
        ] {
            assert_eq!(parse_trade_date(input), Some(expected), "input {:?}", input);
        }
    }

    #[test]
    fn test_parse_trade_date_rejects_garbage() {
        assert_eq!(parse_trade_date(""), None);
        assert_eq!(parse_trade_date("tomorrow"), None);
        assert_eq!(parse_trade_date("2026-13-40"), None);
        assert_eq!(parse_trade_date("20261340"), None);
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("1,234.50").unwrap(), Some(dec!(1234.50)));
        assert_eq!(parse_decimal("-10").unwrap(), Some(dec!(-10)));
        assert_eq!(parse_decimal("(12.5)").unwrap(), Some(dec!(-12.5)));
        assert_eq!(parse_decimal("1.5e2").unwrap(), Some(dec!(150)));
        assert_eq!(parse_decimal("--").unwrap(), None);
        assert_eq!(parse_decimal("  ").unwrap(), None);
        assert!(parse_decimal("abc").is_err());
    }

    #[test]
    fn test_normalize_symbol() {
        assert_eq!(normalize_symbol("AAPL.NASDAQ"), "AAPL");
        assert_eq!(normalize_symbol(" d05.si "), "D05");
        assert_eq!(normalize_symbol("MSFT"), "MSFT");
        // class suffixes are stripped too
        assert_eq!(normalize_symbol("BRK.B"), "BRK");
    }

    #[test]
    fn test_parse_forex_pair() {
        assert_eq!(
            parse_forex_pair("SGD.HKD"),
            Some(("SGD".to_string(), "HKD".to_string()))
        );
        assert_eq!(
            parse_forex_pair("usd.sgd"),
            Some(("USD".to_string(), "SGD".to_string()))
        );
        assert_eq!(parse_forex_pair("AAPL.NASDAQ"), None);
        assert_eq!(parse_forex_pair("BRK.B"), None);
        assert_eq!(parse_forex_pair("SGD"), None);
    }

    #[test]
    fn test_parse_period() {
        let range = parse_period("January 1, 2026 - January 31, 2026").unwrap();
        assert_eq!(range.start, d(2026, 1, 1));
        assert_eq!(range.end, d(2026, 1, 31));

        let en_dash = parse_period("2026-01-01 \u{2013} 2026-03-31").unwrap();
        assert_eq!(en_dash.end, d(2026, 3, 31));

        let single = parse_period("March 5, 2026").unwrap();
        assert_eq!(single.start, single.end);

        assert_eq!(parse_period("sometime"), None);
    }
}
