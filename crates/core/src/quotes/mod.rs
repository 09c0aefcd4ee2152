//! Quote module - the live price collaborator consumed by valuation.

mod manual_provider;
mod quotes_model;
mod quotes_traits;

pub use manual_provider::ManualQuoteProvider;
pub use quotes_model::{LiveQuote, QuoteUpdate};
pub use quotes_traits::QuoteProviderTrait;
