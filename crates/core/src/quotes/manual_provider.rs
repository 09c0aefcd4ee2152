//! In-memory quote provider fed by explicit price updates.

use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use std::collections::HashMap;
use std::sync::RwLock;

use super::quotes_model::{LiveQuote, QuoteUpdate};
use super::quotes_traits::QuoteProviderTrait;
use crate::errors::{Error, Result, ValidationError};

#[derive(Debug, Default)]
pub struct ManualQuoteProvider {
    quotes: RwLock<HashMap<String, LiveQuote>>,
}

impl ManualQuoteProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the latest price of `symbol`, replacing any previous one.
    pub fn set_quote(&self, symbol: &str, update: QuoteUpdate) -> Result<LiveQuote> {
        let symbol = symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(ValidationError::MissingField("symbol".to_string()).into());
        }
        if update.price.is_sign_negative() {
            return Err(ValidationError::InvalidInput(format!(
                "Quote price for {} must not be negative",
                symbol
            ))
            .into());
        }

        let quote = LiveQuote {
            symbol: symbol.clone(),
            price: update.price,
            day_change: update.day_change,
            updated_at: Utc::now(),
        };
        let mut quotes = self
            .quotes
            .write()
            .map_err(|e| Error::Unexpected(format!("Quote store lock poisoned: {}", e)))?;
        quotes.insert(symbol, quote.clone());
        debug!("Manual quote set for {} at {}", quote.symbol, quote.price);
        Ok(quote)
    }

    pub fn remove_quote(&self, symbol: &str) -> Result<Option<LiveQuote>> {
        let mut quotes = self
            .quotes
            .write()
            .map_err(|e| Error::Unexpected(format!("Quote store lock poisoned: {}", e)))?;
        Ok(quotes.remove(&symbol.trim().to_uppercase()))
    }

    /// All stored quotes ordered by symbol.
    pub fn list_quotes(&self) -> Result<Vec<LiveQuote>> {
        let quotes = self
            .quotes
            .read()
            .map_err(|e| Error::Unexpected(format!("Quote store lock poisoned: {}", e)))?;
        let mut list: Vec<LiveQuote> = quotes.values().cloned().collect();
        list.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Ok(list)
    }
}

#[async_trait]
impl QuoteProviderTrait for ManualQuoteProvider {
    async fn get_quote(&self, symbol: &str) -> Result<LiveQuote> {
        let quotes = self
            .quotes
            .read()
            .map_err(|e| Error::Unexpected(format!("Quote store lock poisoned: {}", e)))?;
        quotes
            .get(&symbol.trim().to_uppercase())
            .cloned()
            .ok_or_else(|| Error::Quote(format!("No quote set for {}", symbol)))
    }
}
