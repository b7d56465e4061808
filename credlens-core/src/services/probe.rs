//! Watermark decode client.
//!
//! Single-shot multipart POST against the external decode service. The
//! probe is invoked on every tick of the scanning loop, so a failed or
//! non-OK response is treated identically to "no watermark" and nothing
//! is retried.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Client};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::{WatermarkInfo, WatermarkProbe};
use crate::error::Result;

/// Default watermark decode endpoint.
const DEFAULT_DECODE_URL: &str = "http://localhost:5001/decode";

/// Default timeout for decode requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the watermark decode client.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Decode endpoint URL.
    pub decode_url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            decode_url: std::env::var("WATERMARK_DECODE_URL")
                .unwrap_or_else(|_| DEFAULT_DECODE_URL.to_string()),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// HTTP client for the external watermark decode service.
pub struct HttpWatermarkProbe {
    client: Client,
    config: ProbeConfig,
}

impl HttpWatermarkProbe {
    /// Create a probe client with default settings.
    pub fn new() -> Result<Self> {
        Self::with_config(ProbeConfig::default())
    }

    /// Create a probe client with custom configuration.
    pub fn with_config(config: ProbeConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }
}

/// Extract a positive detection from a decode response body.
///
/// The service reports misses as `present: false` and internal failures as
/// an error-shaped `watermark` object; both are absences here. A hit with
/// no usable secret is also an absence, since nothing downstream could
/// resolve it.
fn parse_decode_body(body: &Value) -> Option<WatermarkInfo> {
    let watermark = body.get("watermark")?;
    if !watermark.get("present")?.as_bool()? {
        return None;
    }
    Some(WatermarkInfo {
        present: true,
        secret: watermark.get("secret")?.as_str()?.to_string(),
        schema: watermark
            .get("schema")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    })
}

#[async_trait]
impl WatermarkProbe for HttpWatermarkProbe {
    #[instrument(level = "debug", skip_all, fields(url = %self.config.decode_url, len = bytes.len()))]
    async fn probe(&self, bytes: &[u8]) -> Option<WatermarkInfo> {
        let part = multipart::Part::bytes(bytes.to_vec())
            .file_name("frame.png")
            .mime_str("image/png")
            .ok()?;
        let form = multipart::Form::new().part("image", part);

        let response = match self
            .client
            .post(&self.config.decode_url)
            .multipart(form)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "watermark decode request failed");
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            debug!(status = %status, "watermark decode returned non-success");
            return None;
        }

        let body: Value = match response.json().await {
            Ok(body) => body,
            Err(err) => {
                warn!(error = %err, "watermark decode body malformed");
                return None;
            }
        };

        let info = parse_decode_body(&body);
        match &info {
            Some(info) => debug!(schema = %info.schema, "watermark detected"),
            None => debug!("no watermark"),
        }
        info
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_positive_detection() {
        let body = json!({
            "watermark": { "present": true, "secret": "abc123", "schema": "v1" }
        });
        let info = parse_decode_body(&body).unwrap();
        assert!(info.present);
        assert_eq!(info.secret, "abc123");
        assert_eq!(info.schema, "v1");
    }

    #[test]
    fn test_parse_miss() {
        let body = json!({
            "watermark": { "present": false, "secret": "", "schema": "v1" }
        });
        assert!(parse_decode_body(&body).is_none());
    }

    #[test]
    fn test_parse_error_shaped_watermark() {
        // The decode service reports its own failures inline
        let body = json!({ "watermark": { "error": "decoder crashed" } });
        assert!(parse_decode_body(&body).is_none());
    }

    #[test]
    fn test_parse_missing_watermark_field() {
        assert!(parse_decode_body(&json!({ "c2pa_manifest": null })).is_none());
        assert!(parse_decode_body(&json!({})).is_none());
    }

    #[test]
    fn test_parse_hit_without_secret() {
        let body = json!({ "watermark": { "present": true, "schema": "v1" } });
        assert!(parse_decode_body(&body).is_none());
    }

    #[test]
    fn test_default_config_reads_env_fallback() {
        let config = ProbeConfig::default();
        assert!(!config.decode_url.is_empty());
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_create_client() {
        assert!(HttpWatermarkProbe::new().is_ok());
    }

    // Run with: cargo test -p credlens-core test_probe_live -- --ignored
    #[tokio::test]
    #[ignore = "requires a running watermark decode service"]
    async fn test_probe_live() {
        use crate::services::WatermarkProbe as _;
        let probe = HttpWatermarkProbe::new().unwrap();
        let _ = probe.probe(&[0u8; 64]).await;
    }
}
