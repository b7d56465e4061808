//! Camera feed abstraction.
//!
//! The camera is modeled as an owned, passed-in resource handle with
//! scoped acquire/release rather than ambient state reached through
//! closures. One scan session owns the handle exclusively; release
//! happens exactly once per session, on whichever exit path fires first.

use async_trait::async_trait;

use crate::error::Result;

/// A raw decoded frame as handed over by a video source (RGB8, row-major).
#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl VideoFrame {
    pub fn new(pixels: Vec<u8>, width: u32, height: u32) -> Self {
        debug_assert_eq!(pixels.len(), (width * height * 3) as usize);
        Self {
            pixels,
            width,
            height,
        }
    }
}

/// Exclusive handle on a live camera feed.
#[async_trait]
pub trait VideoSource: Send + Sync {
    /// Open the device and start the stream. Permission or device failure
    /// is fatal for the session; there is no fallback.
    async fn acquire(&self) -> Result<()>;

    /// The most recent decoded frame, if one is available yet.
    fn frame(&self) -> Option<VideoFrame>;

    /// Stop all tracks. Must tolerate being called when the feed is
    /// already closed.
    fn release(&self);

    /// Number of live tracks; 0 once released.
    fn track_count(&self) -> usize;
}
