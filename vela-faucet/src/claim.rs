use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::timeout;
use tracing::{error, info};
use vela_core::gateway::DisbursementGateway;
use vela_core::quota::same_utc_day;
use vela_core::repository::{ClaimReservation, QuotaLedgerStore};
use vela_core::{start_of_hour, CoreError};

/// Closed set of claim-flow outcomes. `QuotaExhausted` and
/// `AlreadyClaimed` are expected control results, not failures; storage
/// and gateway failures travel as `Err(CoreError)` instead.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClaimOutcome {
    Success,
    QuotaExhausted,
    AlreadyClaimed,
}

#[derive(Debug, Clone)]
pub struct FaucetConfig {
    /// Global cap on tokens issued per calendar hour.
    pub hourly_quota: i64,
    /// Fixed amount disbursed per successful claim.
    pub per_account_quota: i64,
    /// Bound on the on-chain transfer call.
    pub gateway_timeout: Duration,
}

impl Default for FaucetConfig {
    fn default() -> Self {
        Self {
            hourly_quota: 10_000,
            per_account_quota: 400,
            gateway_timeout: Duration::from_secs(30),
        }
    }
}

/// Request-driven token claim flow: rate-limit checks against the quota
/// ledger, then an on-chain disbursement.
pub struct ClaimService {
    ledger: Arc<dyn QuotaLedgerStore>,
    chain: Arc<dyn DisbursementGateway>,
    config: FaucetConfig,
}

impl ClaimService {
    pub fn new(
        ledger: Arc<dyn QuotaLedgerStore>,
        chain: Arc<dyn DisbursementGateway>,
        config: FaucetConfig,
    ) -> Self {
        Self {
            ledger,
            chain,
            config,
        }
    }

    pub async fn claim(&self, account: &str) -> Result<ClaimOutcome, CoreError> {
        self.claim_at(account, Utc::now()).await
    }

    /// Claim as of the given instant. The instant fixes both the hour
    /// bucket and the calendar day used for the per-account limit.
    pub async fn claim_at(
        &self,
        account: &str,
        now: DateTime<Utc>,
    ) -> Result<ClaimOutcome, CoreError> {
        let hour = start_of_hour(now);
        let quota = self.config.per_account_quota;

        let distributed = self.ledger.get_or_create_hour_bucket(hour).await?;
        if distributed >= self.config.hourly_quota {
            return Ok(ClaimOutcome::QuotaExhausted);
        }

        if let Some(last) = self.ledger.last_claim(account).await? {
            if same_utc_day(last, now) {
                return Ok(ClaimOutcome::AlreadyClaimed);
            }
        }

        if distributed + quota > self.config.hourly_quota {
            return Ok(ClaimOutcome::QuotaExhausted);
        }

        // The reservation is the arbiter under concurrency: it re-runs the
        // day-latch and cap checks serialized with the writes, so racing
        // claims for one account record exactly one claim and racing
        // claims near the cap cannot jointly overshoot it.
        match self
            .ledger
            .reserve_claim(account, hour, quota, self.config.hourly_quota, now)
            .await?
        {
            ClaimReservation::Reserved => {}
            ClaimReservation::AlreadyClaimed => return Ok(ClaimOutcome::AlreadyClaimed),
            ClaimReservation::QuotaExhausted => return Ok(ClaimOutcome::QuotaExhausted),
        }

        // The ledger already records the claim as consumed. A transfer
        // failure from here on is surfaced to the caller but the ledger
        // mutation stands: the account counts as having claimed today and
        // the hour bucket keeps the amount. Claims are authoritative
        // regardless of disbursement.
        match timeout(self.config.gateway_timeout, self.chain.transfer(account, quota)).await {
            Ok(Ok(())) => {
                info!(account, amount = quota, "tokens disbursed");
                Ok(ClaimOutcome::Success)
            }
            Ok(Err(err)) => {
                error!(account, "disbursement failed after ledger update: {err}");
                Err(err)
            }
            Err(_) => {
                error!(account, "disbursement timed out after ledger update");
                Err(CoreError::GatewayTimeout(format!(
                    "no transfer confirmation within {:?}",
                    self.config.gateway_timeout
                )))
            }
        }
    }

    /// On-chain balance passthrough.
    pub async fn balance(&self, account: &str) -> Result<String, CoreError> {
        self.chain.balance(account).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
    use vela_store::memory::MemoryStore;

    struct FakeChain {
        transferred: AtomicI64,
        fail: AtomicBool,
    }

    impl FakeChain {
        fn new() -> Self {
            Self {
                transferred: AtomicI64::new(0),
                fail: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl DisbursementGateway for FakeChain {
        async fn transfer(&self, _account: &str, amount: i64) -> Result<(), CoreError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(CoreError::Gateway("broadcast rejected".into()));
            }
            self.transferred.fetch_add(amount, Ordering::SeqCst);
            Ok(())
        }

        async fn balance(&self, _account: &str) -> Result<String, CoreError> {
            Ok(self.transferred.load(Ordering::SeqCst).to_string())
        }
    }

    fn service_with(
        ledger: Arc<MemoryStore>,
        chain: Arc<FakeChain>,
    ) -> ClaimService {
        ClaimService::new(ledger, chain, FaucetConfig::default())
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 24, 12, 30, 0).unwrap()
    }

    #[tokio::test]
    async fn first_claim_succeeds_and_fills_ledger() {
        let ledger = Arc::new(MemoryStore::new());
        let chain = Arc::new(FakeChain::new());
        let service = service_with(ledger.clone(), chain.clone());

        let outcome = service.claim_at("tenant-a", noon()).await.unwrap();
        assert_eq!(outcome, ClaimOutcome::Success);
        assert_eq!(chain.transferred.load(Ordering::SeqCst), 400);

        let bucket = ledger
            .get_or_create_hour_bucket(start_of_hour(noon()))
            .await
            .unwrap();
        assert_eq!(bucket, 400);
        assert_eq!(ledger.last_claim("tenant-a").await.unwrap(), Some(noon()));
    }

    #[tokio::test]
    async fn same_day_retry_is_already_claimed_with_no_mutation() {
        let ledger = Arc::new(MemoryStore::new());
        let chain = Arc::new(FakeChain::new());
        let service = service_with(ledger.clone(), chain.clone());

        service.claim_at("tenant-a", noon()).await.unwrap();
        let retry = service
            .claim_at("tenant-a", noon() + chrono::Duration::hours(3))
            .await
            .unwrap();
        assert_eq!(retry, ClaimOutcome::AlreadyClaimed);

        // No second transfer, bucket unchanged for the retry hour.
        assert_eq!(chain.transferred.load(Ordering::SeqCst), 400);
        let retry_hour = start_of_hour(noon() + chrono::Duration::hours(3));
        assert_eq!(
            ledger.get_or_create_hour_bucket(retry_hour).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn next_day_claim_succeeds_and_accumulates() {
        let ledger = Arc::new(MemoryStore::new());
        let chain = Arc::new(FakeChain::new());
        let service = service_with(ledger.clone(), chain.clone());

        service.claim_at("tenant-a", noon()).await.unwrap();
        let next_day = noon() + chrono::Duration::days(1);
        let outcome = service.claim_at("tenant-a", next_day).await.unwrap();
        assert_eq!(outcome, ClaimOutcome::Success);
        assert_eq!(chain.transferred.load(Ordering::SeqCst), 800);
        assert_eq!(ledger.last_claim("tenant-a").await.unwrap(), Some(next_day));
    }

    #[tokio::test]
    async fn near_cap_claim_is_quota_exhausted_with_no_mutation() {
        let ledger = Arc::new(MemoryStore::new());
        let chain = Arc::new(FakeChain::new());
        let service = service_with(ledger.clone(), chain.clone());

        let hour = start_of_hour(noon());
        ledger.seed_hour_bucket(hour, 9800);

        // 9800 + 400 > 10000: rejected before any write.
        let outcome = service.claim_at("tenant-a", noon()).await.unwrap();
        assert_eq!(outcome, ClaimOutcome::QuotaExhausted);
        assert_eq!(ledger.get_or_create_hour_bucket(hour).await.unwrap(), 9800);
        assert_eq!(ledger.last_claim("tenant-a").await.unwrap(), None);
        assert_eq!(chain.transferred.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn claim_below_cap_boundary_succeeds() {
        let ledger = Arc::new(MemoryStore::new());
        let chain = Arc::new(FakeChain::new());
        let service = service_with(ledger.clone(), chain.clone());

        let hour = start_of_hour(noon());
        ledger.seed_hour_bucket(hour, 9000);

        let outcome = service.claim_at("tenant-a", noon()).await.unwrap();
        assert_eq!(outcome, ClaimOutcome::Success);
        assert_eq!(ledger.get_or_create_hour_bucket(hour).await.unwrap(), 9400);
        assert_eq!(ledger.last_claim("tenant-a").await.unwrap(), Some(noon()));
    }

    #[tokio::test]
    async fn concurrent_claims_never_overshoot_the_hourly_cap() {
        let ledger = Arc::new(MemoryStore::new());
        let chain = Arc::new(FakeChain::new());
        let service = Arc::new(ClaimService::new(
            ledger.clone(),
            chain.clone(),
            FaucetConfig {
                hourly_quota: 1200,
                ..FaucetConfig::default()
            },
        ));

        // 1200 / 400 = 3 slots for 10 racing accounts.
        let mut handles = Vec::new();
        for i in 0..10 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                service.claim_at(&format!("tenant-{i}"), noon()).await
            }));
        }

        let mut successes = 0;
        for handle in handles {
            match handle.await.unwrap().unwrap() {
                ClaimOutcome::Success => successes += 1,
                ClaimOutcome::QuotaExhausted => {}
                ClaimOutcome::AlreadyClaimed => panic!("distinct accounts cannot collide"),
            }
        }

        assert_eq!(successes, 3);
        let bucket = ledger
            .get_or_create_hour_bucket(start_of_hour(noon()))
            .await
            .unwrap();
        assert!(bucket <= 1200, "cap overshot: {bucket}");
        assert_eq!(bucket, 1200);
    }

    /// Ledger wrapper that holds every racer at the last-claim read until
    /// all of them have observed the pre-claim state, forcing the worst
    /// interleaving for duplicate claims.
    struct GatedLedger {
        inner: MemoryStore,
        gate: tokio::sync::Barrier,
    }

    #[async_trait]
    impl QuotaLedgerStore for GatedLedger {
        async fn get_or_create_hour_bucket(&self, hour: DateTime<Utc>) -> Result<i64, CoreError> {
            self.inner.get_or_create_hour_bucket(hour).await
        }

        async fn last_claim(&self, account: &str) -> Result<Option<DateTime<Utc>>, CoreError> {
            let last = self.inner.last_claim(account).await;
            self.gate.wait().await;
            last
        }

        async fn reserve_claim(
            &self,
            account: &str,
            hour: DateTime<Utc>,
            amount: i64,
            cap: i64,
            now: DateTime<Utc>,
        ) -> Result<ClaimReservation, CoreError> {
            self.inner.reserve_claim(account, hour, amount, cap, now).await
        }
    }

    #[tokio::test]
    async fn racing_same_account_claims_record_exactly_one() {
        let ledger = Arc::new(GatedLedger {
            inner: MemoryStore::new(),
            gate: tokio::sync::Barrier::new(2),
        });
        let chain = Arc::new(FakeChain::new());
        let service = Arc::new(ClaimService::new(
            ledger.clone(),
            chain.clone(),
            FaucetConfig::default(),
        ));

        // Both claims pass the read-side day check before either writes.
        let first = tokio::spawn({
            let service = service.clone();
            async move { service.claim_at("tenant-a", noon()).await }
        });
        let second = tokio::spawn({
            let service = service.clone();
            async move { service.claim_at("tenant-a", noon()).await }
        });
        let outcomes = [
            first.await.unwrap().unwrap(),
            second.await.unwrap().unwrap(),
        ];

        let successes = outcomes
            .iter()
            .filter(|o| **o == ClaimOutcome::Success)
            .count();
        let duplicates = outcomes
            .iter()
            .filter(|o| **o == ClaimOutcome::AlreadyClaimed)
            .count();
        assert_eq!(successes, 1, "outcomes: {outcomes:?}");
        assert_eq!(duplicates, 1, "outcomes: {outcomes:?}");

        // One disbursement, and the loser left no trace in the bucket.
        assert_eq!(chain.transferred.load(Ordering::SeqCst), 400);
        let bucket = ledger
            .inner
            .get_or_create_hour_bucket(start_of_hour(noon()))
            .await
            .unwrap();
        assert_eq!(bucket, 400);
        assert_eq!(
            ledger.inner.last_claim("tenant-a").await.unwrap(),
            Some(noon())
        );
    }

    #[tokio::test]
    async fn disbursement_failure_keeps_ledger_mutation() {
        let ledger = Arc::new(MemoryStore::new());
        let chain = Arc::new(FakeChain::new());
        chain.fail.store(true, Ordering::SeqCst);
        let service = service_with(ledger.clone(), chain.clone());

        let err = service.claim_at("tenant-a", noon()).await.unwrap_err();
        assert!(matches!(err, CoreError::Gateway(_)));

        // Quota consumed even though no tokens moved.
        let hour = start_of_hour(noon());
        assert_eq!(ledger.get_or_create_hour_bucket(hour).await.unwrap(), 400);
        assert_eq!(ledger.last_claim("tenant-a").await.unwrap(), Some(noon()));

        // And the same-day retry reports AlreadyClaimed, not a new attempt.
        chain.fail.store(false, Ordering::SeqCst);
        let retry = service.claim_at("tenant-a", noon()).await.unwrap();
        assert_eq!(retry, ClaimOutcome::AlreadyClaimed);
        assert_eq!(chain.transferred.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn fully_issued_hour_rejects_without_touching_accounts() {
        let ledger = Arc::new(MemoryStore::new());
        let chain = Arc::new(FakeChain::new());
        let service = service_with(ledger.clone(), chain.clone());

        let hour = start_of_hour(noon());
        ledger.seed_hour_bucket(hour, 10_000);

        let outcome = service.claim_at("tenant-a", noon()).await.unwrap();
        assert_eq!(outcome, ClaimOutcome::QuotaExhausted);
        assert_eq!(ledger.last_claim("tenant-a").await.unwrap(), None);
    }
}
