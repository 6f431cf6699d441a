use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use vela_core::gateway::{DisbursementGateway, ProvisioningGateway};
use vela_core::CoreError;
use vela_store::app_config::{ChainConfig, ProvisionerConfig};

/// HTTP client for the multitenancy control plane: allocates a tenant
/// workspace plus a resource quota per paid order.
pub struct WorkspaceGateway {
    base: String,
    cluster: String,
    client: reqwest::Client,
}

impl WorkspaceGateway {
    pub fn new(config: &ProvisionerConfig) -> Self {
        Self {
            base: config.url.trim_end_matches('/').to_string(),
            cluster: config.cluster.clone(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ProvisioningGateway for WorkspaceGateway {
    async fn provision(
        &self,
        order_id: &str,
        account: &str,
        cpu_cores: i32,
        ram_gb: i32,
        storage_gb: i32,
    ) -> Result<(), CoreError> {
        let url = format!("{}/workspaces", self.base);
        let body = json!({
            "workspace": order_id,
            "owner": account,
            "cluster": self.cluster,
            "quota": {
                "cpu": cpu_cores,
                "ram_gb": ram_gb,
                "storage_gb": storage_gb,
            },
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(CoreError::gateway)?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(CoreError::Gateway(format!(
                "workspace allocation for {order_id}: {status} {detail}"
            )));
        }
        Ok(())
    }
}

/// HTTP client for the chain-side token service: transfers tokens from
/// the faucet account and reads contract balances.
pub struct ChainGateway {
    base: String,
    contract: String,
    client: reqwest::Client,
}

impl ChainGateway {
    pub fn new(config: &ChainConfig) -> Self {
        Self {
            base: config.service_url.trim_end_matches('/').to_string(),
            contract: config.token_contract_address.clone(),
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Deserialize)]
struct BalanceResponse {
    balance: String,
}

#[async_trait]
impl DisbursementGateway for ChainGateway {
    async fn transfer(&self, account: &str, amount: i64) -> Result<(), CoreError> {
        let url = format!("{}/transfer", self.base);
        let body = json!({
            "recipient": account,
            "amount": amount.to_string(),
            "contract": self.contract,
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(CoreError::gateway)?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(CoreError::Gateway(format!(
                "transfer to {account}: {status} {detail}"
            )));
        }
        Ok(())
    }

    async fn balance(&self, account: &str) -> Result<String, CoreError> {
        let url = format!(
            "{}/balance/{}?contract={}",
            self.base, account, self.contract
        );
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(CoreError::gateway)?;

        let status = response.status();
        if !status.is_success() {
            return Err(CoreError::Gateway(format!(
                "balance query for {account}: {status}"
            )));
        }

        let parsed: BalanceResponse = response.json().await.map_err(CoreError::gateway)?;
        Ok(parsed.balance)
    }
}
