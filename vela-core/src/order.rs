use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

/// Order status in the lifecycle.
///
/// `Created` is the only initial state. `Done`, `Expired`, `Failed` and
/// `Timeout` are terminal. Transitions are one-directional and are only
/// written by the reconciler via compare-and-swap updates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Created,
    Paid,
    Done,
    Expired,
    Failed,
    Timeout,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Done | OrderStatus::Expired | OrderStatus::Failed | OrderStatus::Timeout
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Created => "CREATED",
            OrderStatus::Paid => "PAID",
            OrderStatus::Done => "DONE",
            OrderStatus::Expired => "EXPIRED",
            OrderStatus::Failed => "FAILED",
            OrderStatus::Timeout => "TIMEOUT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CREATED" => Some(OrderStatus::Created),
            "PAID" => Some(OrderStatus::Paid),
            "DONE" => Some(OrderStatus::Done),
            "EXPIRED" => Some(OrderStatus::Expired),
            "FAILED" => Some(OrderStatus::Failed),
            "TIMEOUT" => Some(OrderStatus::Timeout),
            _ => None,
        }
    }
}

/// Resource shape a tenant asks to purchase for a fixed duration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceRequest {
    pub cpu_cores: i32,
    pub ram_gb: i32,
    pub storage_gb: i32,
    pub duration_hours: i32,
}

impl ResourceRequest {
    /// Bounds check, applied before any pricing or state mutation.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !(1..=32).contains(&self.cpu_cores) {
            return Err(CoreError::Validation(format!(
                "cpu_cores {} out of range 1-32",
                self.cpu_cores
            )));
        }
        if !(1..=64).contains(&self.ram_gb) {
            return Err(CoreError::Validation(format!(
                "ram_gb {} out of range 1-64",
                self.ram_gb
            )));
        }
        if !(40..=4000).contains(&self.storage_gb) {
            return Err(CoreError::Validation(format!(
                "storage_gb {} out of range 40-4000",
                self.storage_gb
            )));
        }
        if !(1..=720).contains(&self.duration_hours) {
            return Err(CoreError::Validation(format!(
                "duration_hours {} out of range 1-720",
                self.duration_hours
            )));
        }
        Ok(())
    }
}

/// A tenant's purchase of compute capacity at a frozen price.
///
/// Orders are never deleted; terminal statuses keep the audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub account: String,
    pub cpu_cores: i32,
    pub ram_gb: i32,
    pub storage_gb: i32,
    pub duration_hours: i32,
    pub status: OrderStatus,
    /// Token cost, computed once at creation time and never recomputed.
    pub price: i64,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn new(account: String, request: ResourceRequest, price: i64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            account,
            cpu_cores: request.cpu_cores,
            ram_gb: request.ram_gb,
            storage_gb: request.storage_gb,
            duration_hours: request.duration_hours,
            status: OrderStatus::Created,
            price,
            created_at: Utc::now(),
        }
    }
}
