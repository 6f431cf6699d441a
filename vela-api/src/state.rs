use std::sync::Arc;

use vela_faucet::ClaimService;
use vela_order::OrderService;

#[derive(Clone)]
pub struct AppState {
    pub orders: Arc<OrderService>,
    pub faucet: Arc<ClaimService>,
}
