use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use vela_core::{CoreError, OrderStatus, ResourceRequest};

use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/order/price", get(price))
        .route("/order/create", post(create))
        .route("/order/history", get(history))
}

#[derive(Deserialize)]
struct PriceQuery {
    cpu: i32,
    ram: i32,
    storage: i32,
    duration: i32,
}

impl PriceQuery {
    fn into_request(self) -> ResourceRequest {
        ResourceRequest {
            cpu_cores: self.cpu,
            ram_gb: self.ram,
            storage_gb: self.storage,
            duration_hours: self.duration,
        }
    }
}

async fn price(
    State(state): State<AppState>,
    Query(query): Query<PriceQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let cost = state.orders.price(query.into_request())?;
    Ok(Json(json!({ "cost": cost })))
}

#[derive(Deserialize)]
struct CreateOrderRequest {
    account: String,
    cpu: i32,
    ram: i32,
    storage: i32,
    duration: i32,
}

async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateOrderRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let request = ResourceRequest {
        cpu_cores: body.cpu,
        ram_gb: body.ram,
        storage_gb: body.storage,
        duration_hours: body.duration,
    };
    let id = state.orders.create_order(&body.account, request).await?;
    Ok(Json(json!({ "id": id })))
}

#[derive(Deserialize)]
struct HistoryQuery {
    account: String,
    #[serde(default = "default_page")]
    page: u32,
    #[serde(default = "default_size")]
    size: u32,
    status: Option<String>,
}

fn default_page() -> u32 {
    1
}

fn default_size() -> u32 {
    20
}

async fn history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let status = match &query.status {
        Some(s) => Some(OrderStatus::parse(s).ok_or_else(|| {
            ApiError::Core(CoreError::Validation(format!("unknown status '{s}'")))
        })?),
        None => None,
    };

    let (list, total) = state
        .orders
        .list_orders(&query.account, query.page, query.size, status)
        .await?;
    Ok(Json(json!({ "list": list, "total": total })))
}
