use async_trait::async_trait;

use super::quotes_model::LiveQuote;
use crate::errors::Result;

/// Source of live prices for valuation.
///
/// A failed lookup only leaves the affected position unvalued.
#[async_trait]
pub trait QuoteProviderTrait: Send + Sync {
    async fn get_quote(&self, symbol: &str) -> Result<LiveQuote>;
}
