use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/faucet/claim", get(claim))
        .route("/faucet/balance", get(balance))
}

#[derive(Deserialize)]
struct AccountQuery {
    account: String,
}

async fn claim(
    State(state): State<AppState>,
    Query(query): Query<AccountQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let outcome = state.faucet.claim(&query.account).await?;
    Ok(Json(json!({ "outcome": outcome })))
}

async fn balance(
    State(state): State<AppState>,
    Query(query): Query<AccountQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let balance = state.faucet.balance(&query.account).await?;
    Ok(Json(json!({ "balance": balance })))
}
