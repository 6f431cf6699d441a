use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub reconciler: ReconcilerSettings,
    pub faucet: FaucetSettings,
    pub pricing: PricingSettings,
    pub provisioner: ProvisionerConfig,
    pub chain: ChainConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReconcilerSettings {
    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: u64,
    /// Unpaid orders older than this many hours are timed out. Absent
    /// means the timeout policy is disabled.
    pub payment_window_hours: Option<i64>,
    #[serde(default = "default_gateway_timeout_seconds")]
    pub gateway_timeout_seconds: u64,
}

fn default_interval_seconds() -> u64 {
    120
}

fn default_gateway_timeout_seconds() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct FaucetSettings {
    #[serde(default = "default_hourly_quota")]
    pub hourly_quota: i64,
    #[serde(default = "default_per_account_quota")]
    pub per_account_quota: i64,
}

fn default_hourly_quota() -> i64 {
    10_000
}

fn default_per_account_quota() -> i64 {
    400
}

#[derive(Debug, Deserialize, Clone)]
pub struct PricingSettings {
    pub cpu_core_hour: i64,
    pub ram_gb_hour: i64,
    pub storage_gb_hour: i64,
}

/// Workspace provisioner endpoint (multitenancy control plane).
#[derive(Debug, Deserialize, Clone)]
pub struct ProvisionerConfig {
    pub url: String,
    pub cluster: String,
}

/// Chain-side token service endpoint.
#[derive(Debug, Deserialize, Clone)]
pub struct ChainConfig {
    pub service_url: String,
    pub token_contract_address: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("VELA").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
