use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use vela_core::gateway::{PaymentOracle, ProvisioningGateway};
use vela_core::repository::OrderStore;
use vela_core::{CoreError, OrderStatus};

#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Period between ticks.
    pub interval: Duration,
    /// Orders still unpaid after this window are moved to `Timeout`.
    /// `None` disables the policy and unpaid orders wait indefinitely.
    pub payment_window: Option<chrono::Duration>,
    /// Bound on each external gateway call; an elapsed deadline counts as
    /// a failure of that call.
    pub gateway_timeout: Duration,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(120),
            payment_window: None,
            gateway_timeout: Duration::from_secs(30),
        }
    }
}

/// Periodic control loop advancing order state:
/// `Created --payment confirmed--> Paid --provisioning ok--> Done`,
/// `Paid --provisioning error--> Expired`,
/// `Created --window elapsed--> Timeout`.
///
/// Every transition is a compare-and-swap on the expected prior status, so
/// re-scans and concurrent reconciler instances cannot replay one.
pub struct OrderReconciler {
    orders: Arc<dyn OrderStore>,
    oracle: Arc<dyn PaymentOracle>,
    provisioner: Arc<dyn ProvisioningGateway>,
    config: ReconcilerConfig,
    // Single-flight guard: a tick that fires while the previous one is
    // still running is skipped, not queued.
    busy: tokio::sync::Mutex<()>,
}

impl OrderReconciler {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        oracle: Arc<dyn PaymentOracle>,
        provisioner: Arc<dyn ProvisioningGateway>,
        config: ReconcilerConfig,
    ) -> Self {
        Self {
            orders,
            oracle,
            provisioner,
            config,
            busy: tokio::sync::Mutex::new(()),
        }
    }

    /// Start the periodic loop on a dedicated task.
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(self.config.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(period = ?self.config.interval, "order reconciler started");
            loop {
                ticker.tick().await;
                self.tick().await;
            }
        })
    }

    /// Run one tick: the payment pass, then the provisioning pass.
    pub async fn tick(&self) {
        let _guard = match self.busy.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                warn!("previous reconciler tick still in flight, skipping");
                return;
            }
        };
        self.confirm_payments().await;
        self.provision_paid().await;
    }

    /// Pass A: move payment-confirmed orders from `Created` to `Paid`,
    /// and orders past the payment window to `Timeout`.
    async fn confirm_payments(&self) {
        let list = match self.orders.list_by_status(OrderStatus::Created).await {
            Ok(list) => list,
            Err(err) => {
                error!("listing created orders: {err}");
                return;
            }
        };

        let now = Utc::now();
        for order in list {
            if let Some(window) = self.config.payment_window {
                if now > order.created_at + window {
                    self.transition(&order.id, OrderStatus::Created, OrderStatus::Timeout)
                        .await;
                    continue;
                }
            }

            let paid = match self.bounded(self.oracle.is_paid(&order)).await {
                Ok(paid) => paid,
                Err(err) => {
                    error!(order = %order.id, "payment oracle: {err}");
                    continue;
                }
            };
            if paid {
                self.transition(&order.id, OrderStatus::Created, OrderStatus::Paid)
                    .await;
            }
        }
    }

    /// Pass B: provision every `Paid` order. Success moves it to `Done`;
    /// any provisioning error is terminal and moves it to `Expired`. One
    /// order's failure never blocks its siblings in the same pass.
    async fn provision_paid(&self) {
        let list = match self.orders.list_by_status(OrderStatus::Paid).await {
            Ok(list) => list,
            Err(err) => {
                error!("listing paid orders: {err}");
                return;
            }
        };

        for order in list {
            let result = self
                .bounded(self.provisioner.provision(
                    &order.id,
                    &order.account,
                    order.cpu_cores,
                    order.ram_gb,
                    order.storage_gb,
                ))
                .await;

            let target = match result {
                Ok(()) => OrderStatus::Done,
                Err(err) => {
                    error!(order = %order.id, "provisioning: {err}");
                    OrderStatus::Expired
                }
            };
            self.transition(&order.id, OrderStatus::Paid, target).await;
        }
    }

    async fn transition(&self, id: &str, from: OrderStatus, to: OrderStatus) {
        match self.orders.update_status(id, from, to).await {
            Ok(true) => info!(order = %id, from = from.as_str(), to = to.as_str(), "order transitioned"),
            Ok(false) => debug!(order = %id, "transition lost the race, row already moved"),
            Err(err) => error!(order = %id, "updating status: {err}"),
        }
    }

    async fn bounded<T>(
        &self,
        call: impl std::future::Future<Output = Result<T, CoreError>>,
    ) -> Result<T, CoreError> {
        match timeout(self.config.gateway_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(CoreError::GatewayTimeout(format!(
                "no response within {:?}",
                self.config.gateway_timeout
            ))),
        }
    }
}
