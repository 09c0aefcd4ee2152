//! Imports module - statement import batches, dedup and retraction.

mod imports_model;
mod imports_service;
mod imports_traits;

pub use imports_model::*;
pub use imports_service::ImportService;
pub use imports_traits::{ImportServiceTrait, LedgerRepositoryTrait};

#[cfg(test)]
mod imports_service_tests;
