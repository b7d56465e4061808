//! Live frame scanning.
//!
//! `FrameCaptureScanner` drives a camera feed: a repeating tick captures a
//! centered square crop and probes it for a watermark until the first
//! positive hit or cancellation. The session is an explicit state machine
//! with a generation counter, so stale ticks and stale probe results are
//! discarded by id comparison instead of flag checks scattered through
//! closures.
//!
//! # Single-flight ticks
//!
//! A probe can outlive the tick period when the decode service is slow.
//! The probe is awaited inline on the tick loop and missed ticks are
//! skipped, never queued, so two probes can never read overlapping crops
//! of the same feed.

mod capture;
mod mock;
mod video;

pub use capture::{capture_frame, CaptureFrame, DEFAULT_CROP_RATIO};
pub use mock::MockVideoSource;
pub use video::{VideoFrame, VideoSource};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};

use crate::error::Result;
use crate::services::WatermarkProbe;

/// Default interval between scan ticks.
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_millis(1000);

/// Lifecycle of a scan session. `Found`, `Stopped` and `Error` are
/// terminal: the camera handle is released and the timer cancelled exactly
/// once on the way in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Initializing,
    Scanning,
    Found,
    Stopped,
    Error,
}

impl ScanState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Found | Self::Stopped | Self::Error)
    }

    fn is_active(&self) -> bool {
        matches!(self, Self::Initializing | Self::Scanning)
    }
}

/// Scanner tuning knobs.
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// Interval between candidate frames.
    pub tick_period: Duration,
    /// Fraction of the shorter video dimension covered by the square crop.
    pub crop_ratio: f32,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            tick_period: DEFAULT_TICK_PERIOD,
            crop_ratio: DEFAULT_CROP_RATIO,
        }
    }
}

/// One scan session: state, generation, and the owned resources that must
/// be torn down exactly once.
struct Session {
    state: ScanState,
    generation: u64,
    video: Option<Arc<dyn VideoSource>>,
    cancel: Option<watch::Sender<bool>>,
}

impl Session {
    fn new() -> Self {
        Self {
            state: ScanState::Idle,
            generation: 0,
            video: None,
            cancel: None,
        }
    }

    /// Cancel the timer and release the camera, then enter `next`.
    /// Both resources are `take`n, so repeated calls are safe no-ops.
    fn shut_down(&mut self, next: ScanState) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(true);
        }
        if let Some(video) = self.video.take() {
            video.release();
        }
        self.state = next;
    }
}

/// Drives a camera feed, probing a cropped frame per tick until the first
/// positive detection or cancellation.
pub struct FrameCaptureScanner<P> {
    probe: Arc<P>,
    config: ScannerConfig,
    session: Arc<Mutex<Session>>,
}

impl<P> FrameCaptureScanner<P>
where
    P: WatermarkProbe + 'static,
{
    pub fn new(probe: P) -> Self {
        Self::with_config(probe, ScannerConfig::default())
    }

    pub fn with_config(probe: P, config: ScannerConfig) -> Self {
        Self {
            probe: Arc::new(probe),
            config,
            session: Arc::new(Mutex::new(Session::new())),
        }
    }

    /// Current session state.
    pub fn state(&self) -> ScanState {
        lock(&self.session).state
    }

    /// Begin scanning the given feed.
    ///
    /// No-op when a session is already initializing or scanning. Camera
    /// acquisition failure is terminal (`Error`) and surfaced to the
    /// caller. On the first positive detection the session closes itself
    /// and `on_detected` is invoked exactly once with the matching frame.
    #[instrument(level = "info", skip_all)]
    pub async fn start<F>(&self, video: Arc<dyn VideoSource>, on_detected: F) -> Result<()>
    where
        F: FnOnce(CaptureFrame) + Send + 'static,
    {
        let generation = {
            let mut session = lock(&self.session);
            if session.state.is_active() {
                debug!(state = ?session.state, "scan already in progress");
                return Ok(());
            }
            session.generation += 1;
            session.state = ScanState::Initializing;
            session.generation
        };

        if let Err(err) = video.acquire().await {
            warn!(error = %err, "camera acquisition failed");
            let mut session = lock(&self.session);
            if session.generation == generation {
                video.release();
                session.state = ScanState::Error;
            }
            return Err(err);
        }

        let (cancel_tx, cancel_rx) = watch::channel(false);
        {
            let mut session = lock(&self.session);
            if session.generation != generation || session.state != ScanState::Initializing {
                // stop() or a newer start() won the race while the camera
                // was being acquired; this session never owned the handle
                video.release();
                return Ok(());
            }
            session.video = Some(Arc::clone(&video));
            session.cancel = Some(cancel_tx);
            session.state = ScanState::Scanning;
        }

        info!(
            generation,
            period_ms = self.config.tick_period.as_millis() as u64,
            "scan session started"
        );

        let probe = Arc::clone(&self.probe);
        let session = Arc::clone(&self.session);
        let config = self.config.clone();
        tokio::spawn(scan_loop(
            generation, video, probe, session, config, cancel_rx, on_detected,
        ));

        Ok(())
    }

    /// Stop scanning. No-op when idle or already terminal; never panics.
    pub fn stop(&self) {
        let mut session = lock(&self.session);
        match session.state {
            ScanState::Idle => {}
            ScanState::Found | ScanState::Stopped | ScanState::Error => {
                debug!(state = ?session.state, "stop on settled session ignored");
            }
            ScanState::Initializing | ScanState::Scanning => {
                session.shut_down(ScanState::Stopped);
                info!("scan session stopped");
            }
        }
    }

    /// Grab and crop a single frame outside any scan session.
    pub fn capture_once(&self, video: &dyn VideoSource) -> Option<CaptureFrame> {
        capture_frame(&video.frame()?, self.config.crop_ratio)
    }
}

impl<P> Drop for FrameCaptureScanner<P> {
    fn drop(&mut self) {
        let mut session = lock(&self.session);
        if session.state.is_active() {
            session.shut_down(ScanState::Stopped);
        }
    }
}

fn lock(session: &Mutex<Session>) -> MutexGuard<'_, Session> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn scan_loop<P, F>(
    generation: u64,
    video: Arc<dyn VideoSource>,
    probe: Arc<P>,
    session: Arc<Mutex<Session>>,
    config: ScannerConfig,
    mut cancel: watch::Receiver<bool>,
    on_detected: F,
) where
    P: WatermarkProbe,
    F: FnOnce(CaptureFrame) + Send,
{
    let mut on_detected = Some(on_detected);
    let mut ticker = time::interval_at(
        time::Instant::now() + config.tick_period,
        config.tick_period,
    );
    // Ticks missed while a probe is in flight are dropped, not queued
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.changed() => break,
            _ = ticker.tick() => {}
        }
        if *cancel.borrow() {
            break;
        }

        let Some(raw) = video.frame() else {
            debug!(generation, "no frame available yet");
            continue;
        };
        let Some(frame) = capture_frame(&raw, config.crop_ratio) else {
            continue;
        };

        // Awaited inline: a slow probe holds the loop, and the skipped
        // ticks above keep probes single-flight.
        match probe.probe(&frame.image_bytes).await {
            Some(detection) => {
                {
                    let mut session = lock(&session);
                    if session.generation != generation
                        || session.state != ScanState::Scanning
                    {
                        debug!(generation, "stale detection discarded");
                        break;
                    }
                    session.shut_down(ScanState::Found);
                }

                info!(generation, schema = %detection.schema, "watermark detected, session closed");
                if let Some(callback) = on_detected.take() {
                    callback(frame);
                }
                break;
            }
            None => {
                debug!(generation, square = frame.square_size, "no watermark in frame");
            }
        }
    }
}
