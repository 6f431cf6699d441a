use serde::{Deserialize, Serialize};
use vela_core::ResourceRequest;

/// Hourly token rates per resource unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    pub cpu_core_hour: i64,
    pub ram_gb_hour: i64,
    pub storage_gb_hour: i64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            cpu_core_hour: 100,
            ram_gb_hour: 50,
            storage_gb_hour: 2,
        }
    }
}

/// Deterministic token cost of a resource request.
///
/// Pure integer arithmetic: same inputs always produce the same price.
/// Callers validate bounds first; the price is computed once at order
/// creation and frozen onto the order row.
pub fn total_cost(config: &PricingConfig, request: ResourceRequest) -> i64 {
    let per_hour = request.cpu_cores as i64 * config.cpu_core_hour
        + request.ram_gb as i64 * config.ram_gb_hour
        + request.storage_gb as i64 * config.storage_gb_hour;
    per_hour * request.duration_hours as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_request() -> ResourceRequest {
        ResourceRequest {
            cpu_cores: 4,
            ram_gb: 4,
            storage_gb: 50,
            duration_hours: 12,
        }
    }

    #[test]
    fn cost_is_deterministic() {
        let config = PricingConfig::default();
        let first = total_cost(&config, reference_request());
        for _ in 0..10 {
            assert_eq!(total_cost(&config, reference_request()), first);
        }
    }

    #[test]
    fn reference_cost() {
        // (4*100 + 4*50 + 50*2) * 12
        let config = PricingConfig::default();
        assert_eq!(total_cost(&config, reference_request()), 8400);
    }

    #[test]
    fn cost_is_non_negative_across_bounds() {
        let config = PricingConfig::default();
        let min = ResourceRequest {
            cpu_cores: 1,
            ram_gb: 1,
            storage_gb: 40,
            duration_hours: 1,
        };
        let max = ResourceRequest {
            cpu_cores: 32,
            ram_gb: 64,
            storage_gb: 4000,
            duration_hours: 720,
        };
        assert!(total_cost(&config, min) >= 0);
        assert!(total_cost(&config, max) >= 0);
    }
}
