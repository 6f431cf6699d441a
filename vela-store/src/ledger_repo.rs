use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use vela_core::repository::{ClaimReservation, QuotaLedgerStore};
use vela_core::{start_of_utc_day, CoreError};

pub struct PgQuotaLedger {
    pool: PgPool,
}

impl PgQuotaLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QuotaLedgerStore for PgQuotaLedger {
    async fn get_or_create_hour_bucket(&self, hour: DateTime<Utc>) -> Result<i64, CoreError> {
        sqlx::query(
            "INSERT INTO hourly_quotas (hour, distributed_amount) VALUES ($1, 0)
             ON CONFLICT (hour) DO NOTHING",
        )
        .bind(hour)
        .execute(&self.pool)
        .await
        .map_err(CoreError::storage)?;

        let row: (i64,) =
            sqlx::query_as("SELECT distributed_amount FROM hourly_quotas WHERE hour = $1")
                .bind(hour)
                .fetch_one(&self.pool)
                .await
                .map_err(CoreError::storage)?;
        Ok(row.0)
    }

    async fn last_claim(&self, account: &str) -> Result<Option<DateTime<Utc>>, CoreError> {
        let row: Option<(DateTime<Utc>,)> =
            sqlx::query_as("SELECT last_claim FROM user_claims WHERE account = $1")
                .bind(account)
                .fetch_optional(&self.pool)
                .await
                .map_err(CoreError::storage)?;
        Ok(row.map(|(at,)| at))
    }

    async fn reserve_claim(
        &self,
        account: &str,
        hour: DateTime<Utc>,
        amount: i64,
        cap: i64,
        now: DateTime<Utc>,
    ) -> Result<ClaimReservation, CoreError> {
        let day_start = start_of_utc_day(now);
        let mut tx = self.pool.begin().await.map_err(CoreError::storage)?;

        sqlx::query(
            "INSERT INTO hourly_quotas (hour, distributed_amount) VALUES ($1, 0)
             ON CONFLICT (hour) DO NOTHING",
        )
        .bind(hour)
        .execute(&mut *tx)
        .await
        .map_err(CoreError::storage)?;

        // The row lock serializes racing claims for the rest of the
        // transaction; the checks below read a stable bucket value.
        let (distributed,): (i64,) =
            sqlx::query_as("SELECT distributed_amount FROM hourly_quotas WHERE hour = $1 FOR UPDATE")
                .bind(hour)
                .fetch_one(&mut *tx)
                .await
                .map_err(CoreError::storage)?;
        if distributed + amount > cap {
            tx.rollback().await.map_err(CoreError::storage)?;
            return Ok(ClaimReservation::QuotaExhausted);
        }

        // Day-latched upsert: the DO UPDATE applies only when the existing
        // row's last claim predates today, so a same-day duplicate touches
        // zero rows.
        let claimed = sqlx::query(
            "INSERT INTO user_claims (account, amount, last_claim) VALUES ($1, $2, $3)
             ON CONFLICT (account) DO UPDATE
             SET amount = user_claims.amount + $2, last_claim = $3
             WHERE user_claims.last_claim < $4",
        )
        .bind(account)
        .bind(amount)
        .bind(now)
        .bind(day_start)
        .execute(&mut *tx)
        .await
        .map_err(CoreError::storage)?;
        if claimed.rows_affected() == 0 {
            tx.rollback().await.map_err(CoreError::storage)?;
            return Ok(ClaimReservation::AlreadyClaimed);
        }

        sqlx::query(
            "UPDATE hourly_quotas SET distributed_amount = distributed_amount + $1 WHERE hour = $2",
        )
        .bind(amount)
        .bind(hour)
        .execute(&mut *tx)
        .await
        .map_err(CoreError::storage)?;

        tx.commit().await.map_err(CoreError::storage)?;
        Ok(ClaimReservation::Reserved)
    }
}
