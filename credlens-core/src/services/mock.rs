//! Mock service implementations for testing.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{ManifestReader, RegistryLookup, WatermarkInfo, WatermarkProbe};
use crate::manifest::Manifest;

/// Mock manifest reader serving a fixed outcome.
pub struct MockManifestReader {
    manifest: Option<Manifest>,
    calls: AtomicUsize,
}

impl MockManifestReader {
    /// Always finds the given manifest.
    pub fn hit(manifest: Manifest) -> Self {
        Self {
            manifest: Some(manifest),
            calls: AtomicUsize::new(0),
        }
    }

    /// Never finds a manifest.
    pub fn miss() -> Self {
        Self {
            manifest: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `read` calls observed.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ManifestReader for MockManifestReader {
    async fn read(&self, _bytes: &[u8], _mime: &str) -> Option<Manifest> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.manifest.clone()
    }
}

/// Mock watermark probe serving a fixed outcome.
pub struct MockWatermarkProbe {
    info: Option<WatermarkInfo>,
    calls: AtomicUsize,
}

impl MockWatermarkProbe {
    /// Always detects the given watermark.
    pub fn hit(info: WatermarkInfo) -> Self {
        Self {
            info: Some(info),
            calls: AtomicUsize::new(0),
        }
    }

    /// Never detects a watermark.
    pub fn miss() -> Self {
        Self {
            info: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `probe` calls observed.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WatermarkProbe for MockWatermarkProbe {
    async fn probe(&self, _bytes: &[u8]) -> Option<WatermarkInfo> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.info.clone()
    }
}

/// Mock registry serving a fixed outcome and recording the queried secret.
pub struct MockRegistryLookup {
    manifest: Option<Manifest>,
    calls: AtomicUsize,
    last_secret: Mutex<Option<String>>,
}

impl MockRegistryLookup {
    /// Always resolves to the given manifest.
    pub fn hit(manifest: Manifest) -> Self {
        Self {
            manifest: Some(manifest),
            calls: AtomicUsize::new(0),
            last_secret: Mutex::new(None),
        }
    }

    /// Never resolves (e.g. the registry returned 404).
    pub fn miss() -> Self {
        Self {
            manifest: None,
            calls: AtomicUsize::new(0),
            last_secret: Mutex::new(None),
        }
    }

    /// Number of `lookup` calls observed.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The secret passed to the most recent `lookup` call.
    pub fn last_secret(&self) -> Option<String> {
        self.last_secret
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl RegistryLookup for MockRegistryLookup {
    async fn lookup(&self, secret: &str) -> Option<Manifest> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self
            .last_secret
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(secret.to_string());
        self.manifest.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_reader_counts_calls() {
        let reader = MockManifestReader::miss();
        assert!(reader.read(b"x", "image/png").await.is_none());
        assert!(reader.read(b"y", "image/png").await.is_none());
        assert_eq!(reader.calls(), 2);
    }

    #[tokio::test]
    async fn test_mock_registry_records_secret() {
        let registry = MockRegistryLookup::miss();
        assert!(registry.lookup("abc123").await.is_none());
        assert_eq!(registry.last_secret().as_deref(), Some("abc123"));
        assert_eq!(registry.calls(), 1);
    }
}
