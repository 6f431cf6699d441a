use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Global counter of tokens issued within one calendar hour.
///
/// One row per hour, created lazily on the first claim attempt in that
/// hour; `distributed_amount` only ever increases within its hour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HourBucket {
    pub hour: DateTime<Utc>,
    pub distributed_amount: i64,
}

/// Per-account claim record. At most one row per account; `last_claim`
/// drives the once-per-calendar-day limit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountClaim {
    pub account: String,
    pub amount: i64,
    pub last_claim: DateTime<Utc>,
}

/// Truncate a timestamp to the start of its hour (the bucket key).
pub fn start_of_hour(t: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(t.year(), t.month(), t.day(), t.hour(), 0, 0)
        .single()
        .unwrap_or(t)
}

/// Truncate a timestamp to the start of its UTC calendar day.
pub fn start_of_utc_day(t: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(t.year(), t.month(), t.day(), 0, 0, 0)
        .single()
        .unwrap_or(t)
}

/// Whether two timestamps fall on the same UTC calendar day.
pub fn same_utc_day(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    start_of_utc_day(a) == start_of_utc_day(b)
}
