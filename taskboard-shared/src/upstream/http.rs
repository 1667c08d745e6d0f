/// HTTP record service client
///
/// This module provides the production `RecordService` implementation. It
/// talks JSON to the hosted record service:
///
/// ```text
/// POST {base_url}/records/{collection}/fetch    FetchParams   -> FetchResponse
/// POST {base_url}/records/{collection}/{id}     GetParams     -> GetResponse
/// POST {base_url}/records/{collection}/create   RecordsParams -> MutationResponse
/// POST {base_url}/records/{collection}/update   RecordsParams -> MutationResponse
/// POST {base_url}/records/{collection}/delete   DeleteParams  -> DeleteResponse
/// ```
///
/// Every request carries the project id and public key headers. Non-2xx
/// statuses, transport failures and undecodable bodies are reported as
/// `GatewayError::Upstream`.
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::upstream::{HttpRecordService, UpstreamConfig};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = UpstreamConfig::from_env()?;
/// let service = HttpRecordService::new(config)?;
/// # Ok(())
/// # }
/// ```

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::protocol::{
    DeleteParams, DeleteResponse, FetchParams, FetchResponse, GetParams, GetResponse,
    MutationResponse, RecordsParams,
};
use super::service::RecordService;
use crate::error::{GatewayError, GatewayResult};
use crate::timeout::CallTimeout;

/// Header carrying the upstream project id
pub const PROJECT_ID_HEADER: &str = "X-Project-Id";

/// Header carrying the upstream public key
pub const PUBLIC_KEY_HEADER: &str = "X-Public-Key";

/// Upstream configuration errors
#[derive(Error, Debug)]
pub enum UpstreamConfigError {
    /// Required variable missing or invalid
    #[error("Upstream configuration error: {0}")]
    ConfigError(String),

    /// HTTP client could not be built
    #[error("Upstream client error: {0}")]
    ClientError(String),
}

/// Record service configuration
///
/// Can be loaded from environment variables or constructed manually.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the record service, without trailing slash
    ///
    /// Example: https://records.example.com/api
    pub base_url: String,

    /// Project identifier issued by the platform
    pub project_id: String,

    /// Public key issued by the platform
    pub public_key: String,

    /// Per-call timeout in seconds (clamped to 1..=300)
    pub timeout_secs: u64,
}

impl UpstreamConfig {
    /// Creates a configuration from environment variables
    ///
    /// # Environment Variables
    ///
    /// - `UPSTREAM_BASE_URL`: Record service base URL (required)
    /// - `UPSTREAM_PROJECT_ID`: Project id (required)
    /// - `UPSTREAM_PUBLIC_KEY`: Public key (required)
    /// - `UPSTREAM_TIMEOUT_SECS`: Per-call timeout (default: 30)
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or the base URL is
    /// not an http(s) URL.
    pub fn from_env() -> Result<Self, UpstreamConfigError> {
        // Load .env if present
        dotenvy::dotenv().ok();

        let base_url = required("UPSTREAM_BASE_URL")?;
        let project_id = required("UPSTREAM_PROJECT_ID")?;
        let public_key = required("UPSTREAM_PUBLIC_KEY")?;

        let timeout_secs = env::var("UPSTREAM_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);

        let config = Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            project_id,
            public_key,
            timeout_secs,
        };
        config.validate()?;

        Ok(config)
    }

    /// Checks the base URL scheme
    pub fn validate(&self) -> Result<(), UpstreamConfigError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(UpstreamConfigError::ConfigError(format!(
                "UPSTREAM_BASE_URL must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        Ok(())
    }

    /// Deadline applied to every call
    pub fn call_timeout(&self) -> CallTimeout {
        CallTimeout::from_secs(Some(self.timeout_secs))
    }
}

fn required(key: &str) -> Result<String, UpstreamConfigError> {
    env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| UpstreamConfigError::ConfigError(format!("{} environment variable is required", key)))
}

/// HTTP implementation of `RecordService`
#[derive(Clone)]
pub struct HttpRecordService {
    client: Client,
    config: UpstreamConfig,
}

impl HttpRecordService {
    /// Builds the client
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the TLS backend
    /// cannot be initialized.
    pub fn new(config: UpstreamConfig) -> Result<Self, UpstreamConfigError> {
        config.validate()?;

        // The reqwest timeout is a backstop; the gateway applies its own deadline.
        let client = Client::builder()
            .timeout(config.call_timeout().timeout() + Duration::from_secs(5))
            .build()
            .map_err(|e| UpstreamConfigError::ClientError(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn url(&self, collection: &str, op: &str) -> String {
        format!("{}/records/{}/{}", self.config.base_url, collection, op)
    }

    async fn post<B, R>(&self, url: String, body: &B) -> GatewayResult<R>
    where
        B: Serialize + Sync + ?Sized,
        R: DeserializeOwned,
    {
        tracing::debug!(url = %url, "Calling record service");

        let response = self
            .client
            .post(&url)
            .header(PROJECT_ID_HEADER, &self.config.project_id)
            .header(PUBLIC_KEY_HEADER, &self.config.public_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(GatewayError::Upstream(format!(
                "Record service returned {}: {}",
                status,
                text.chars().take(200).collect::<String>()
            )));
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl RecordService for HttpRecordService {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch_records(&self, collection: &str, params: &FetchParams) -> GatewayResult<FetchResponse> {
        self.post(self.url(collection, "fetch"), params).await
    }

    async fn get_record_by_id(
        &self,
        collection: &str,
        id: i64,
        params: &GetParams,
    ) -> GatewayResult<GetResponse> {
        self.post(self.url(collection, &id.to_string()), params).await
    }

    async fn create_record(&self, collection: &str, params: &RecordsParams) -> GatewayResult<MutationResponse> {
        self.post(self.url(collection, "create"), params).await
    }

    async fn update_record(&self, collection: &str, params: &RecordsParams) -> GatewayResult<MutationResponse> {
        self.post(self.url(collection, "update"), params).await
    }

    async fn delete_record(&self, collection: &str, params: &DeleteParams) -> GatewayResult<DeleteResponse> {
        self.post(self.url(collection, "delete"), params).await
    }
}
