use std::sync::Arc;

use crate::config::Config;
use ledgerfold_core::imports::{ImportService, ImportServiceTrait};
use ledgerfold_core::pipeline::ImportConfig;
use ledgerfold_core::quotes::ManualQuoteProvider;
use ledgerfold_storage_sqlite::{db, LedgerRepository};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

pub struct AppState {
    pub import_service: Arc<dyn ImportServiceTrait + Send + Sync>,
    pub quote_provider: Arc<ManualQuoteProvider>,
}

pub fn init_tracing() {
    let log_format = std::env::var("LF_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let db_path = db::init(&config.db_path)?;
    tracing::info!("Database path in use: {}", db_path);

    let pool = db::create_pool(&db_path)?;
    db::run_migrations(&pool)?;
    let writer = db::spawn_writer((*pool).clone());

    let ledger_repository = Arc::new(LedgerRepository::new(pool.clone(), writer.clone()));
    let import_config = ImportConfig::for_base_currency(&config.base_currency);
    let fallback_rates = import_config.default_rates.len();
    let import_service: Arc<dyn ImportServiceTrait + Send + Sync> =
        Arc::new(ImportService::new(ledger_repository, import_config));
    tracing::info!(
        "Base currency {} with {} fallback rates",
        import_service.base_currency(),
        fallback_rates
    );

    Ok(Arc::new(AppState {
        import_service,
        quote_provider: Arc::new(ManualQuoteProvider::new()),
    }))
}
