//! SQLite storage for import batches and the ledger records they carry.

mod model;
mod repository;

pub use model::{ForexTradeDB, ImportBatchDB, IncomeDB, TradeDB};
pub use repository::LedgerRepository;

// Re-export trait from core for convenience
pub use ledgerfold_core::imports::LedgerRepositoryTrait;
