//! HTTP client for the Relution device inventory.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

use crate::config::InventoryConfig;
use domain::errors::UpstreamError;
use domain::models::{InventoryDevice, InventoryResponse};
use domain::ports::InventorySource;

const DEVICES_PATH: &str = "/relution/api/v1/devices";
const ACCESS_TOKEN_HEADER: &str = "X-User-Access-Token";

/// Pulls the full device snapshot from Relution.
#[derive(Clone)]
pub struct RelutionClient {
    client: Client,
    devices_url: String,
    token: String,
}

impl RelutionClient {
    pub fn new(config: &InventoryConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            devices_url: devices_url(&config.host),
            token: config.token.clone(),
        })
    }
}

/// `host` is a bare host name (HTTPS is implied) or a full base URL.
fn devices_url(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        format!("{}{}", host, DEVICES_PATH)
    } else {
        format!("https://{}{}", host, DEVICES_PATH)
    }
}

#[async_trait::async_trait]
impl InventorySource for RelutionClient {
    async fn fetch_devices(&self) -> Result<Vec<InventoryDevice>, UpstreamError> {
        debug!(url = %self.devices_url, "Pulling device inventory");

        let response = self
            .client
            .get(&self.devices_url)
            .header(ACCESS_TOKEN_HEADER, &self.token)
            .send()
            .await
            .map_err(|e| UpstreamError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Inventory responded with an error status");
            return Err(UpstreamError::Status(status.as_u16()));
        }

        let body: InventoryResponse = response
            .json()
            .await
            .map_err(|e| UpstreamError::Decode(e.to_string()))?;

        debug!(
            status = body.status.as_deref().unwrap_or_default(),
            total = body.total.unwrap_or_default(),
            received = body.results.len(),
            "Inventory snapshot received"
        );
        Ok(body.results)
    }
}
