use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use vela_core::repository::OrderStore;
use vela_core::{CoreError, Order, OrderStatus};

pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: String,
    account: String,
    cpu_cores: i32,
    ram_gb: i32,
    storage_gb: i32,
    duration_hours: i32,
    status: String,
    price: i64,
    created_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self) -> Result<Order, CoreError> {
        let status = OrderStatus::parse(&self.status).ok_or_else(|| {
            CoreError::Storage(format!("unknown status '{}' for order {}", self.status, self.id))
        })?;
        Ok(Order {
            id: self.id,
            account: self.account,
            cpu_cores: self.cpu_cores,
            ram_gb: self.ram_gb,
            storage_gb: self.storage_gb,
            duration_hours: self.duration_hours,
            status,
            price: self.price,
            created_at: self.created_at,
        })
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn insert(&self, order: &Order) -> Result<(), CoreError> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, account, cpu_cores, ram_gb, storage_gb, duration_hours, status, price, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(&order.id)
        .bind(&order.account)
        .bind(order.cpu_cores)
        .bind(order.ram_gb)
        .bind(order.storage_gb)
        .bind(order.duration_hours)
        .bind(order.status.as_str())
        .bind(order.price)
        .bind(order.created_at)
        .execute(&self.pool)
        .await
        .map_err(CoreError::storage)?;
        Ok(())
    }

    async fn list_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, CoreError> {
        let rows: Vec<OrderRow> = sqlx::query_as(
            "SELECT id, account, cpu_cores, ram_gb, storage_gb, duration_hours, status, price, created_at
             FROM orders WHERE status = $1",
        )
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(CoreError::storage)?;

        rows.into_iter().map(OrderRow::into_order).collect()
    }

    async fn update_status(
        &self,
        id: &str,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool, CoreError> {
        // The WHERE clause on the prior status is the idempotency latch:
        // a racing reconciler that already moved the row makes this a
        // zero-row update, not a second transition.
        let result = sqlx::query("UPDATE orders SET status = $1 WHERE id = $2 AND status = $3")
            .bind(to.as_str())
            .bind(id)
            .bind(from.as_str())
            .execute(&self.pool)
            .await
            .map_err(CoreError::storage)?;
        Ok(result.rows_affected() == 1)
    }

    async fn list_by_account(
        &self,
        account: &str,
        page: u32,
        size: u32,
        status: Option<OrderStatus>,
    ) -> Result<(Vec<Order>, i64), CoreError> {
        let page = page.max(1);
        // Saturate: (u32::MAX - 1) * u32::MAX does not fit in i64.
        let offset = i64::from(page - 1).saturating_mul(i64::from(size));

        let (rows, total): (Vec<OrderRow>, i64) = match status {
            Some(status) => {
                let rows = sqlx::query_as(
                    "SELECT id, account, cpu_cores, ram_gb, storage_gb, duration_hours, status, price, created_at
                     FROM orders WHERE account = $1 AND status = $2
                     ORDER BY created_at DESC LIMIT $3 OFFSET $4",
                )
                .bind(account)
                .bind(status.as_str())
                .bind(i64::from(size))
                .bind(offset)
                .fetch_all(&self.pool)
                .await
                .map_err(CoreError::storage)?;

                let total: (i64,) = sqlx::query_as(
                    "SELECT COUNT(*) FROM orders WHERE account = $1 AND status = $2",
                )
                .bind(account)
                .bind(status.as_str())
                .fetch_one(&self.pool)
                .await
                .map_err(CoreError::storage)?;

                (rows, total.0)
            }
            None => {
                let rows = sqlx::query_as(
                    "SELECT id, account, cpu_cores, ram_gb, storage_gb, duration_hours, status, price, created_at
                     FROM orders WHERE account = $1
                     ORDER BY created_at DESC LIMIT $2 OFFSET $3",
                )
                .bind(account)
                .bind(i64::from(size))
                .bind(offset)
                .fetch_all(&self.pool)
                .await
                .map_err(CoreError::storage)?;

                let total: (i64,) =
                    sqlx::query_as("SELECT COUNT(*) FROM orders WHERE account = $1")
                        .bind(account)
                        .fetch_one(&self.pool)
                        .await
                        .map_err(CoreError::storage)?;

                (rows, total.0)
            }
        };

        let orders = rows
            .into_iter()
            .map(OrderRow::into_order)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((orders, total))
    }
}
