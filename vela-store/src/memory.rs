use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use vela_core::quota::same_utc_day;
use vela_core::repository::{ClaimReservation, OrderStore, QuotaLedgerStore};
use vela_core::{CoreError, Order, OrderStatus};

#[derive(Default)]
struct Ledger {
    buckets: HashMap<DateTime<Utc>, i64>,
    claims: HashMap<String, (i64, DateTime<Utc>)>,
}

/// In-memory implementation of both storage contracts, used by the
/// service tests and for local development without Postgres. Each method
/// takes the lock for its whole read-check-write, which serializes
/// mutations the way row-level locking does in the SQL store.
#[derive(Default)]
pub struct MemoryStore {
    orders: Mutex<Vec<Order>>,
    ledger: Mutex<Ledger>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix an hour bucket to a known amount. Seeding hook for tests that
    /// need a partially or fully issued hour.
    pub fn seed_hour_bucket(&self, hour: DateTime<Utc>, amount: i64) {
        let mut ledger = self.ledger.lock().expect("ledger lock");
        ledger.buckets.insert(hour, amount);
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn insert(&self, order: &Order) -> Result<(), CoreError> {
        let mut orders = self.orders.lock().expect("orders lock");
        if orders.iter().any(|o| o.id == order.id) {
            return Err(CoreError::Storage(format!(
                "duplicate order id {}",
                order.id
            )));
        }
        orders.push(order.clone());
        Ok(())
    }

    async fn list_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, CoreError> {
        let orders = self.orders.lock().expect("orders lock");
        Ok(orders
            .iter()
            .filter(|o| o.status == status)
            .cloned()
            .collect())
    }

    async fn update_status(
        &self,
        id: &str,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool, CoreError> {
        let mut orders = self.orders.lock().expect("orders lock");
        match orders.iter_mut().find(|o| o.id == id && o.status == from) {
            Some(order) => {
                order.status = to;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_by_account(
        &self,
        account: &str,
        page: u32,
        size: u32,
        status: Option<OrderStatus>,
    ) -> Result<(Vec<Order>, i64), CoreError> {
        let orders = self.orders.lock().expect("orders lock");
        let matching: Vec<Order> = orders
            .iter()
            .filter(|o| o.account == account && status.map_or(true, |s| o.status == s))
            .cloned()
            .collect();
        let total = matching.len() as i64;
        let page = page.max(1);
        // Widen before multiplying; u32 * u32 can exceed u32::MAX.
        let offset = u64::from(page - 1) * u64::from(size);
        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        let slice = matching
            .into_iter()
            .skip(offset)
            .take(size as usize)
            .collect();
        Ok((slice, total))
    }
}

#[async_trait]
impl QuotaLedgerStore for MemoryStore {
    async fn get_or_create_hour_bucket(&self, hour: DateTime<Utc>) -> Result<i64, CoreError> {
        let mut ledger = self.ledger.lock().expect("ledger lock");
        Ok(*ledger.buckets.entry(hour).or_insert(0))
    }

    async fn last_claim(&self, account: &str) -> Result<Option<DateTime<Utc>>, CoreError> {
        let ledger = self.ledger.lock().expect("ledger lock");
        Ok(ledger.claims.get(account).map(|(_, at)| *at))
    }

    async fn reserve_claim(
        &self,
        account: &str,
        hour: DateTime<Utc>,
        amount: i64,
        cap: i64,
        now: DateTime<Utc>,
    ) -> Result<ClaimReservation, CoreError> {
        // Single lock over both checks and both writes; this is the
        // in-memory equivalent of the SQL store's transaction.
        let mut ledger = self.ledger.lock().expect("ledger lock");

        let distributed = ledger.buckets.get(&hour).copied().unwrap_or(0);
        if distributed + amount > cap {
            return Ok(ClaimReservation::QuotaExhausted);
        }
        if let Some(&(_, last)) = ledger.claims.get(account) {
            if same_utc_day(last, now) {
                return Ok(ClaimReservation::AlreadyClaimed);
            }
        }

        *ledger.buckets.entry(hour).or_insert(0) += amount;
        ledger
            .claims
            .entry(account.to_string())
            .and_modify(|(total, last)| {
                *total += amount;
                *last = now;
            })
            .or_insert((amount, now));
        Ok(ClaimReservation::Reserved)
    }
}
