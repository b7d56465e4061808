//! Mock video source for testing.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::video::{VideoFrame, VideoSource};
use crate::error::{CredlensError, Result};

/// Deterministic in-memory camera feed.
///
/// Serves a fixed sequence of frames (cycling on exhaustion) and tracks
/// acquire/release calls so tests can assert on resource discipline.
pub struct MockVideoSource {
    frames: Vec<VideoFrame>,
    cursor: AtomicUsize,
    tracks: AtomicUsize,
    fail_acquire: bool,
}

impl MockVideoSource {
    pub fn new(frames: Vec<VideoFrame>) -> Self {
        Self {
            frames,
            cursor: AtomicUsize::new(0),
            tracks: AtomicUsize::new(0),
            fail_acquire: false,
        }
    }

    /// A source whose device cannot be opened.
    pub fn unavailable() -> Self {
        Self {
            frames: Vec::new(),
            cursor: AtomicUsize::new(0),
            tracks: AtomicUsize::new(0),
            fail_acquire: true,
        }
    }

    /// Uniform-color RGB frame helper.
    pub fn solid_frame(width: u32, height: u32, rgb: [u8; 3]) -> VideoFrame {
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for _ in 0..(width * height) {
            pixels.extend_from_slice(&rgb);
        }
        VideoFrame::new(pixels, width, height)
    }

    /// Number of frames handed out so far.
    pub fn frames_served(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VideoSource for MockVideoSource {
    async fn acquire(&self) -> Result<()> {
        if self.fail_acquire {
            return Err(CredlensError::CameraUnavailable(
                "mock device is unavailable".into(),
            ));
        }
        self.tracks.store(1, Ordering::SeqCst);
        Ok(())
    }

    fn frame(&self) -> Option<VideoFrame> {
        if self.tracks.load(Ordering::SeqCst) == 0 || self.frames.is_empty() {
            return None;
        }
        let index = self.cursor.fetch_add(1, Ordering::SeqCst);
        Some(self.frames[index % self.frames.len()].clone())
    }

    fn release(&self) {
        self.tracks.store(0, Ordering::SeqCst);
    }

    fn track_count(&self) -> usize {
        self.tracks.load(Ordering::SeqCst)
    }
}
