use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::errors::InventoryError;
use crate::models::InventoryStatus;

// ============================================================================
// Inventory Client
// ============================================================================
//
// Stock lookup against the inventory service. The client is a plain
// transport: no retries, no breaker of its own. Callers decide how to guard
// the call.
//
// ============================================================================

#[async_trait]
pub trait InventoryClient: Send + Sync {
    /// Check stock for the given SKUs, one status per requested code.
    async fn check_stock(
        &self,
        sku_codes: &[String],
    ) -> Result<Vec<InventoryStatus>, InventoryError>;
}

pub struct HttpInventoryClient {
    client: Client,
    base_url: String,
}

impl HttpInventoryClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, InventoryError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| InventoryError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl InventoryClient for HttpInventoryClient {
    async fn check_stock(
        &self,
        sku_codes: &[String],
    ) -> Result<Vec<InventoryStatus>, InventoryError> {
        let url = format!("{}/api/inventory", self.base_url);
        // Repeated query parameter: ?skuCodeList=a&skuCodeList=b
        let query: Vec<(&str, &str)> = sku_codes
            .iter()
            .map(|sku| ("skuCodeList", sku.as_str()))
            .collect();

        let response = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| InventoryError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(InventoryError::Status(status.as_u16()));
        }

        let statuses = response
            .json::<Vec<InventoryStatus>>()
            .await
            .map_err(|e| InventoryError::Decode(e.to_string()))?;

        tracing::debug!(
            skus = sku_codes.len(),
            results = statuses.len(),
            "Inventory check completed"
        );

        Ok(statuses)
    }
}
