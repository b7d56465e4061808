//! Provenance resolution fallback chain.
//!
//! A single `resolve` call walks the ranked chain: embedded credential,
//! then invisible watermark, then registry record, short-circuiting on the
//! first hit. Each call runs a fresh state machine with no retries; a
//! monotonically increasing generation id detects resolutions superseded
//! by a newer input so a slow network response can never overwrite the
//! result produced for a newer file.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, instrument};

use crate::manifest::Manifest;
use crate::services::{ManifestReader, RegistryLookup, WatermarkInfo, WatermarkProbe};

/// Ranked outcome of one resolution. Immutable once produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ProvenanceResult {
    /// A credential embedded in the file itself. Highest tier.
    Embedded(Manifest),
    /// No embedded credential, but the watermark resolved to a registry
    /// record.
    Registered(Manifest),
    /// A watermark with no registry record behind it.
    WatermarkOnly(WatermarkInfo),
    /// Neither an embedded credential nor a watermark.
    None,
}

impl ProvenanceResult {
    /// Tier name, ranked `embedded > registered > watermark-only > none`.
    pub fn tier(&self) -> &'static str {
        match self {
            Self::Embedded(_) => "embedded",
            Self::Registered(_) => "registered",
            Self::WatermarkOnly(_) => "watermark-only",
            Self::None => "none",
        }
    }

    /// The manifest carried by this result, if its tier produced one.
    pub fn manifest(&self) -> Option<&Manifest> {
        match self {
            Self::Embedded(manifest) | Self::Registered(manifest) => Some(manifest),
            _ => None,
        }
    }
}

/// Visible outcome of one `resolve` call under the supersession guard.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// This call was still the newest when it finished.
    Settled(ProvenanceResult),
    /// A newer input arrived while this call was in flight; its result was
    /// discarded.
    Superseded,
}

impl Resolution {
    pub fn settled(self) -> Option<ProvenanceResult> {
        match self {
            Self::Settled(result) => Some(result),
            Self::Superseded => None,
        }
    }
}

/// Internal state of one resolution pass. Every branch is terminal.
#[derive(Debug)]
enum ResolveState {
    NotStarted,
    CheckingEmbedded,
    CheckingWatermark,
    CheckingRegistry(WatermarkInfo),
}

/// Orchestrates the manifest reader, the watermark probe, and the registry
/// into a single ranked result per input.
pub struct ProvenanceResolver<M, W, R> {
    reader: M,
    probe: W,
    registry: R,
    generation: AtomicU64,
}

impl<M, W, R> ProvenanceResolver<M, W, R>
where
    M: ManifestReader,
    W: WatermarkProbe,
    R: RegistryLookup,
{
    pub fn new(reader: M, probe: W, registry: R) -> Self {
        Self {
            reader,
            probe,
            registry,
            generation: AtomicU64::new(0),
        }
    }

    /// Resolve the highest-ranked provenance for one input.
    ///
    /// Order is strict and short-circuits on the first hit: embedded
    /// manifest, then watermark probe, then registry lookup. Calling
    /// `resolve` again before a prior call finished supersedes it; the
    /// stale call returns [`Resolution::Superseded`] instead of a result.
    #[instrument(level = "debug", skip_all, fields(mime = %mime, len = bytes.len()))]
    pub async fn resolve(&self, bytes: &[u8], mime: &str) -> Resolution {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let mut state = ResolveState::NotStarted;

        loop {
            state = match state {
                ResolveState::NotStarted => ResolveState::CheckingEmbedded,

                ResolveState::CheckingEmbedded => {
                    let manifest = self.reader.read(bytes, mime).await;
                    if self.is_stale(generation) {
                        return Resolution::Superseded;
                    }
                    match manifest {
                        Some(manifest) => {
                            debug!(generation, "embedded credential found");
                            return Resolution::Settled(ProvenanceResult::Embedded(manifest));
                        }
                        None => ResolveState::CheckingWatermark,
                    }
                }

                ResolveState::CheckingWatermark => {
                    let info = self.probe.probe(bytes).await;
                    if self.is_stale(generation) {
                        return Resolution::Superseded;
                    }
                    match info {
                        Some(info) => ResolveState::CheckingRegistry(info),
                        None => {
                            debug!(generation, "no embedded credential, no watermark");
                            return Resolution::Settled(ProvenanceResult::None);
                        }
                    }
                }

                ResolveState::CheckingRegistry(info) => {
                    let manifest = self.registry.lookup(&info.secret).await;
                    if self.is_stale(generation) {
                        return Resolution::Superseded;
                    }
                    match manifest {
                        Some(manifest) => {
                            debug!(generation, "watermark resolved against registry");
                            return Resolution::Settled(ProvenanceResult::Registered(manifest));
                        }
                        None => {
                            debug!(generation, schema = %info.schema, "registry miss, watermark only");
                            return Resolution::Settled(ProvenanceResult::WatermarkOnly(info));
                        }
                    }
                }
            };
        }
    }

    fn is_stale(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) != generation
    }
}
