//! FX module - rate tables resolved from statement conversions, with fallback defaults.

mod default_rates;
mod fx_errors;
mod fx_model;
pub mod resolver;

pub use default_rates::{default_rates_for, sgd_default_rates};
pub use fx_errors::FxError;
pub use fx_model::{
    FxFallbackReason, FxFallbackWarning, FxObservation, FxProvenance, FxRateTable,
};
pub use resolver::{FxResolution, FxResolver};
