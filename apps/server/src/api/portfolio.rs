use std::sync::Arc;

use crate::{error::ApiResult, main_lib::AppState};
use axum::{extract::State, routing::get, Json, Router};
use ledgerfold_core::fx::FxObservation;
use ledgerfold_core::imports::PositionsReport;
use ledgerfold_core::portfolio::income::IncomeSummary;
use ledgerfold_core::portfolio::valuation::PortfolioValuation;

async fn get_positions(State(state): State<Arc<AppState>>) -> ApiResult<Json<PositionsReport>> {
    Ok(Json(state.import_service.get_positions()?))
}

async fn get_valued_positions(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<PortfolioValuation>> {
    let valuation = state
        .import_service
        .get_valuation(state.quote_provider.as_ref())
        .await?;
    Ok(Json(valuation))
}

async fn get_fx_rates(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<FxObservation>>> {
    Ok(Json(state.import_service.get_fx_rates()?))
}

async fn get_income_summary(State(state): State<Arc<AppState>>) -> ApiResult<Json<IncomeSummary>> {
    Ok(Json(state.import_service.get_income_summary()?))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/positions", get(get_positions))
        .route("/positions/valued", get(get_valued_positions))
        .route("/fx/rates", get(get_fx_rates))
        .route("/income/summary", get(get_income_summary))
}
