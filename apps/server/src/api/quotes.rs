use std::sync::Arc;

use crate::{
    error::{ApiError, ApiResult},
    main_lib::AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use ledgerfold_core::quotes::{LiveQuote, QuoteUpdate};

async fn list_quotes(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<LiveQuote>>> {
    Ok(Json(state.quote_provider.list_quotes()?))
}

async fn update_quote(
    Path(symbol): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(update): Json<QuoteUpdate>,
) -> ApiResult<Json<LiveQuote>> {
    Ok(Json(state.quote_provider.set_quote(&symbol, update)?))
}

async fn delete_quote(
    Path(symbol): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<StatusCode> {
    match state.quote_provider.remove_quote(&symbol)? {
        Some(_) => Ok(StatusCode::NO_CONTENT),
        None => Err(ApiError::NotFound),
    }
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/quotes", get(list_quotes))
        .route("/quotes/{symbol}", put(update_quote).delete(delete_quote))
}
