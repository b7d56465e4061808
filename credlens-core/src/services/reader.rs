//! Embedded manifest extraction via the c2pa SDK.

use std::io::Cursor;

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use super::ManifestReader;
use crate::manifest::Manifest;

/// Reads embedded C2PA manifests with the `c2pa` crate.
///
/// The SDK is treated as an opaque collaborator: whatever it reports
/// (malformed file, unsupported codec, verification failure) maps to
/// absence, logged at `warn`, so resolution can continue down the chain.
#[derive(Debug, Default, Clone)]
pub struct C2paManifestReader;

impl C2paManifestReader {
    pub fn new() -> Self {
        Self
    }

    fn read_store(bytes: &[u8], mime: &str) -> Option<Manifest> {
        let reader = match c2pa::Reader::from_stream(mime, Cursor::new(bytes)) {
            Ok(reader) => reader,
            Err(err) => {
                warn!(error = %err, mime, "manifest parse failed, treating as absent");
                return None;
            }
        };

        reader.active_manifest()?;

        let store: serde_json::Value = match serde_json::from_str(&reader.json()) {
            Ok(store) => store,
            Err(err) => {
                warn!(error = %err, "manifest store JSON malformed, treating as absent");
                return None;
            }
        };

        Manifest::from_sdk_store(&store)
    }
}

#[async_trait]
impl ManifestReader for C2paManifestReader {
    #[instrument(level = "debug", skip_all, fields(mime = %mime, len = bytes.len()))]
    async fn read(&self, bytes: &[u8], mime: &str) -> Option<Manifest> {
        let manifest = Self::read_store(bytes, mime);
        match &manifest {
            Some(manifest) => debug!(
                assertions = manifest.assertions.len(),
                "embedded manifest extracted"
            ),
            None => debug!("no embedded manifest"),
        }
        manifest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ManifestReader;

    #[tokio::test]
    async fn test_garbage_bytes_map_to_absent() {
        let reader = C2paManifestReader::new();
        assert!(reader.read(b"definitely not an image", "image/png").await.is_none());
    }

    #[tokio::test]
    async fn test_unsupported_mime_maps_to_absent() {
        let reader = C2paManifestReader::new();
        assert!(reader.read(&[0u8; 16], "application/x-unknown").await.is_none());
    }
}
