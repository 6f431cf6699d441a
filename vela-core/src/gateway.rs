use async_trait::async_trait;

use crate::error::CoreError;
use crate::order::Order;

/// Reports whether payment for an order has been confirmed.
#[async_trait]
pub trait PaymentOracle: Send + Sync {
    async fn is_paid(&self, order: &Order) -> Result<bool, CoreError>;
}

/// Allocates a tenant workspace and resource quota for a paid order.
/// Any error is treated by the reconciler as a permanent failure for
/// that order.
#[async_trait]
pub trait ProvisioningGateway: Send + Sync {
    async fn provision(
        &self,
        order_id: &str,
        account: &str,
        cpu_cores: i32,
        ram_gb: i32,
        storage_gb: i32,
    ) -> Result<(), CoreError>;
}

/// Transfers tokens to a tenant account on the chain.
#[async_trait]
pub trait DisbursementGateway: Send + Sync {
    async fn transfer(&self, account: &str, amount: i64) -> Result<(), CoreError>;

    async fn balance(&self, account: &str) -> Result<String, CoreError>;
}

/// Placeholder oracle for deployments where on-chain payment confirmation
/// is not wired up yet: every order is reported as not-yet-paid. Orders
/// sit in `Created` until the payment window policy times them out.
pub struct PendingPaymentOracle;

#[async_trait]
impl PaymentOracle for PendingPaymentOracle {
    async fn is_paid(&self, _order: &Order) -> Result<bool, CoreError> {
        Ok(false)
    }
}
