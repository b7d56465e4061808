//! Narrow interfaces over the three external collaborators.
//!
//! The manifest parser, the watermark decoder, and the registry are opaque
//! services. Each is reached through one trait whose contract encodes the
//! error taxonomy: absence is an expected outcome expressed as `None`,
//! never as an error. A failed or malformed service response degrades to
//! absence at the adapter boundary and is logged, not propagated.

mod mock;
mod probe;
mod reader;
mod registry;

pub use mock::{MockManifestReader, MockRegistryLookup, MockWatermarkProbe};
pub use probe::{HttpWatermarkProbe, ProbeConfig};
pub use reader::C2paManifestReader;
pub use registry::{HttpRegistryLookup, RegistryConfig};

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::manifest::Manifest;

/// A decoded invisible watermark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatermarkInfo {
    pub present: bool,
    /// The identifier embedded in the pixel data, resolvable against the
    /// registry.
    pub secret: String,
    pub schema: String,
}

/// Extracts an embedded content credential from raw image bytes.
#[async_trait]
pub trait ManifestReader: Send + Sync {
    /// Absence of a manifest is a valid outcome, not an error; any parser
    /// failure (malformed file, unsupported codec, verification failure)
    /// maps to `None`.
    async fn read(&self, bytes: &[u8], mime: &str) -> Option<Manifest>;
}

/// Tests image bytes for a hidden marker.
#[async_trait]
pub trait WatermarkProbe: Send + Sync {
    /// Issues at most one request. The probe runs on every tick of the
    /// scanning loop, so it never retries and never blocks on failure.
    async fn probe(&self, bytes: &[u8]) -> Option<WatermarkInfo>;
}

/// Resolves a watermark identifier to its registered manifest.
#[async_trait]
pub trait RegistryLookup: Send + Sync {
    /// A miss or a failed lookup returns `None`; the resolver then falls
    /// back to the watermark-only tier.
    async fn lookup(&self, secret: &str) -> Option<Manifest>;
}

#[async_trait]
impl<T: ManifestReader + ?Sized> ManifestReader for Arc<T> {
    async fn read(&self, bytes: &[u8], mime: &str) -> Option<Manifest> {
        (**self).read(bytes, mime).await
    }
}

#[async_trait]
impl<T: WatermarkProbe + ?Sized> WatermarkProbe for Arc<T> {
    async fn probe(&self, bytes: &[u8]) -> Option<WatermarkInfo> {
        (**self).probe(bytes).await
    }
}

#[async_trait]
impl<T: RegistryLookup + ?Sized> RegistryLookup for Arc<T> {
    async fn lookup(&self, secret: &str) -> Option<Manifest> {
        (**self).lookup(secret).await
    }
}
