//! Registry lookup client.
//!
//! Resolves a watermark identifier to its registered manifest with a
//! single POST. Failure degrades to absence so the resolver can fall back
//! to the watermark-only tier instead of failing the whole resolution.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::RegistryLookup;
use crate::error::Result;
use crate::manifest::Manifest;

/// Default registry lookup endpoint.
const DEFAULT_LOOKUP_URL: &str = "http://localhost:5001/lookup";

/// Default timeout for lookup requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the registry lookup client.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Lookup endpoint URL.
    pub lookup_url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            lookup_url: std::env::var("REGISTRY_LOOKUP_URL")
                .unwrap_or_else(|_| DEFAULT_LOOKUP_URL.to_string()),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Debug, Serialize)]
struct LookupRequest<'a> {
    watermark_id: &'a str,
}

/// HTTP client for the external registry service.
pub struct HttpRegistryLookup {
    client: Client,
    config: RegistryConfig,
}

impl HttpRegistryLookup {
    /// Create a lookup client with default settings.
    pub fn new() -> Result<Self> {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a lookup client with custom configuration.
    pub fn with_config(config: RegistryConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl RegistryLookup for HttpRegistryLookup {
    #[instrument(level = "debug", skip_all, fields(url = %self.config.lookup_url))]
    async fn lookup(&self, secret: &str) -> Option<Manifest> {
        let response = match self
            .client
            .post(&self.config.lookup_url)
            .json(&LookupRequest {
                watermark_id: secret,
            })
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "registry lookup request failed");
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            debug!(status = %status, "registry lookup returned non-success");
            return None;
        }

        let record: Value = match response.json().await {
            Ok(record) => record,
            Err(err) => {
                warn!(error = %err, "registry lookup body malformed");
                return None;
            }
        };

        // Registry records arrive in the registry-native shape; normalize
        // at this boundary and nowhere else.
        let manifest = Manifest::from_registry_record(&record);
        if manifest.is_none() {
            warn!("registry record did not normalize, treating as miss");
        }
        manifest
    }
}
