use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::CoreError;
use crate::order::{Order, OrderStatus};

/// Durable order table. The reconciler is the only writer of status
/// transitions; the order-creation path is the only inserter.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert(&self, order: &Order) -> Result<(), CoreError>;

    async fn list_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, CoreError>;

    /// Compare-and-swap status transition. Returns `Ok(true)` only if the
    /// row's current status was still `from`; a lost race is `Ok(false)`,
    /// never an error. The status column is the idempotency latch that
    /// keeps concurrent reconciler instances from replaying a transition.
    async fn update_status(
        &self,
        id: &str,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool, CoreError>;

    /// Paginated account history with total count; `status` narrows both
    /// the page and the total.
    async fn list_by_account(
        &self,
        account: &str,
        page: u32,
        size: u32,
        status: Option<OrderStatus>,
    ) -> Result<(Vec<Order>, i64), CoreError>;
}

/// Result of an atomic claim reservation against the quota ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimReservation {
    /// Both counters were updated; the claim is recorded.
    Reserved,
    /// The account already claimed within the calendar day of `now`.
    AlreadyClaimed,
    /// The increment would push the hour bucket past the cap.
    QuotaExhausted,
}

/// Durable quota counters backing the token faucet.
#[async_trait]
pub trait QuotaLedgerStore: Send + Sync {
    /// Read the bucket's distributed amount, creating the row at 0 if this
    /// is the first claim attempt in the hour.
    async fn get_or_create_hour_bucket(&self, hour: DateTime<Utc>) -> Result<i64, CoreError>;

    /// Most recent successful claim for the account. `None` means the
    /// account has never claimed; that is an expected outcome, not an
    /// error.
    async fn last_claim(&self, account: &str) -> Result<Option<DateTime<Utc>>, CoreError>;

    /// Serialized claim reservation: re-checks the account's day latch and
    /// the bucket cap, then upserts the claim row and increments the
    /// bucket, all as one atomic read-check-write. A rejected reservation
    /// mutates nothing. Racing claims for the same account get exactly one
    /// `Reserved`; racing claims near the cap cannot jointly overshoot it.
    async fn reserve_claim(
        &self,
        account: &str,
        hour: DateTime<Utc>,
        amount: i64,
        cap: i64,
        now: DateTime<Utc>,
    ) -> Result<ClaimReservation, CoreError>;
}
