use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FxError {
    #[error("No exchange rate for {currency} on {date}")]
    RateNotFound { currency: String, date: NaiveDate },
}
