//! Credlens Core - content credential resolution and live watermark scanning
//!
//! This crate decides whether an image carries verifiable provenance (a
//! cryptographically signed content credential) and, failing that, whether
//! it carries an invisible watermark resolvable against a registry. It also
//! drives a live camera feed, probing cropped frames until a watermark is
//! detected.
//!
//! # Components
//!
//! - A ranked fallback chain (`Embedded > Registered > WatermarkOnly > None`)
//!   orchestrated by [`ProvenanceResolver`]
//! - A frame-scanning state machine, [`FrameCaptureScanner`], with
//!   single-flight probing and guaranteed camera release
//! - Narrow adapters over the three external collaborators: the C2PA
//!   manifest parser, the watermark decode service, and the registry
//! - One canonical [`Manifest`] type; both wire shapes (SDK store and
//!   registry record) are normalized at the ingestion boundary
//!
//! # Example
//!
//! ```no_run
//! use credlens_core::{
//!     C2paManifestReader, HttpRegistryLookup, HttpWatermarkProbe, ProvenanceResolver,
//!     ProvenanceResult, Resolution,
//! };
//!
//! # async fn example() -> credlens_core::Result<()> {
//! let resolver = ProvenanceResolver::new(
//!     C2paManifestReader::new(),
//!     HttpWatermarkProbe::new()?,
//!     HttpRegistryLookup::new()?,
//! );
//!
//! let bytes = std::fs::read("photo.jpg").expect("test fixture");
//! if let Resolution::Settled(result) = resolver.resolve(&bytes, "image/jpeg").await {
//!     match result {
//!         ProvenanceResult::Embedded(manifest) => {
//!             println!("signed by {:?}", manifest.claim_generator)
//!         }
//!         ProvenanceResult::Registered(manifest) => {
//!             println!("registered: {:?}", manifest.claim_generator)
//!         }
//!         ProvenanceResult::WatermarkOnly(info) => println!("watermark {}", info.secret),
//!         ProvenanceResult::None => {}
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod manifest;
pub mod resolver;
pub mod scanner;
pub mod services;

// Re-export main types for convenience
pub use error::{CredlensError, Result};
pub use manifest::{
    Assertion, CreativeWork, DigitalSourceType, Manifest, SignatureInfo, ACTIONS_LABEL,
    CREATIVE_WORK_LABEL,
};
pub use resolver::{ProvenanceResolver, ProvenanceResult, Resolution};
pub use scanner::{
    capture_frame, CaptureFrame, FrameCaptureScanner, MockVideoSource, ScanState, ScannerConfig,
    VideoFrame, VideoSource, DEFAULT_CROP_RATIO, DEFAULT_TICK_PERIOD,
};
pub use services::{
    C2paManifestReader, HttpRegistryLookup, HttpWatermarkProbe, ManifestReader,
    MockManifestReader, MockRegistryLookup, MockWatermarkProbe, ProbeConfig, RegistryConfig,
    RegistryLookup, WatermarkInfo, WatermarkProbe,
};
