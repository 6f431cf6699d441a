use std::sync::Arc;

use tracing::info;
use vela_core::repository::OrderStore;
use vela_core::{CoreError, Order, OrderStatus, ResourceRequest};

use crate::pricing::{total_cost, PricingConfig};

/// Order-facing operations: pricing preview, order creation, account
/// history. Status transitions after creation belong to the reconciler.
pub struct OrderService {
    store: Arc<dyn OrderStore>,
    pricing: PricingConfig,
}

impl OrderService {
    pub fn new(store: Arc<dyn OrderStore>, pricing: PricingConfig) -> Self {
        Self { store, pricing }
    }

    /// Price a resource request without creating anything.
    pub fn price(&self, request: ResourceRequest) -> Result<i64, CoreError> {
        request.validate()?;
        Ok(total_cost(&self.pricing, request))
    }

    /// Create an order in `Created` state with its price frozen.
    pub async fn create_order(
        &self,
        account: &str,
        request: ResourceRequest,
    ) -> Result<String, CoreError> {
        let price = self.price(request)?;
        let order = Order::new(account.to_string(), request, price);
        let id = order.id.clone();
        self.store.insert(&order).await?;
        info!(order = %id, account, price, "order created");
        Ok(id)
    }

    pub async fn list_orders(
        &self,
        account: &str,
        page: u32,
        size: u32,
        status: Option<OrderStatus>,
    ) -> Result<(Vec<Order>, i64), CoreError> {
        self.store.list_by_account(account, page, size, status).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vela_store::memory::MemoryStore;

    fn request() -> ResourceRequest {
        ResourceRequest {
            cpu_cores: 4,
            ram_gb: 4,
            storage_gb: 50,
            duration_hours: 12,
        }
    }

    #[tokio::test]
    async fn create_order_freezes_price() {
        let store = Arc::new(MemoryStore::new());
        let service = OrderService::new(store.clone(), PricingConfig::default());

        let id = service.create_order("tenant-a", request()).await.unwrap();

        let created = store.list_by_status(OrderStatus::Created).await.unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].id, id);
        assert_eq!(created[0].price, service.price(request()).unwrap());
        assert_eq!(created[0].status, OrderStatus::Created);
    }

    #[tokio::test]
    async fn out_of_range_request_is_rejected_before_any_insert() {
        let store = Arc::new(MemoryStore::new());
        let service = OrderService::new(store.clone(), PricingConfig::default());

        let bad = ResourceRequest {
            cpu_cores: 64,
            ..request()
        };
        let err = service.create_order("tenant-a", bad).await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let created = store.list_by_status(OrderStatus::Created).await.unwrap();
        assert!(created.is_empty());
    }

    #[tokio::test]
    async fn history_pagination_and_status_filter() {
        let store = Arc::new(MemoryStore::new());
        let service = OrderService::new(store.clone(), PricingConfig::default());

        for _ in 0..5 {
            service.create_order("tenant-a", request()).await.unwrap();
        }
        service.create_order("tenant-b", request()).await.unwrap();

        let (page1, total) = service.list_orders("tenant-a", 1, 2, None).await.unwrap();
        assert_eq!(page1.len(), 2);
        assert_eq!(total, 5);

        let (page3, _) = service.list_orders("tenant-a", 3, 2, None).await.unwrap();
        assert_eq!(page3.len(), 1);

        let (done, done_total) = service
            .list_orders("tenant-a", 1, 10, Some(OrderStatus::Done))
            .await
            .unwrap();
        assert!(done.is_empty());
        assert_eq!(done_total, 0);
    }
}
