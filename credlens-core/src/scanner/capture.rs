//! Frame capture: centered square crop and PNG encoding.

use std::io::Cursor;

use chrono::{DateTime, Utc};
use image::{imageops, DynamicImage, ImageFormat, RgbImage};
use tracing::warn;

use super::video::VideoFrame;

/// Fraction of the shorter video dimension covered by the default crop.
pub const DEFAULT_CROP_RATIO: f32 = 0.9;

/// A cropped candidate frame ready for probing.
#[derive(Debug, Clone)]
pub struct CaptureFrame {
    /// PNG-encoded square crop.
    pub image_bytes: Vec<u8>,
    /// Side length of the square crop, in pixels.
    pub square_size: u32,
    pub timestamp: DateTime<Utc>,
}

/// Crop the centered square covering `ratio` of the shorter dimension and
/// encode it as PNG.
///
/// Returns `None` for an empty or malformed frame; the scan loop skips
/// such ticks instead of erroring. The crop buffer is scratch state,
/// rebuilt on every call.
pub fn capture_frame(frame: &VideoFrame, ratio: f32) -> Option<CaptureFrame> {
    if frame.width == 0 || frame.height == 0 {
        return None;
    }

    let ratio = f64::from(ratio.clamp(0.0, 1.0));
    let side = (f64::from(frame.width.min(frame.height)) * ratio).round() as u32;
    if side == 0 {
        return None;
    }

    let image = RgbImage::from_raw(frame.width, frame.height, frame.pixels.clone())?;
    let x = (frame.width - side) / 2;
    let y = (frame.height - side) / 2;
    let crop = imageops::crop_imm(&image, x, y, side, side).to_image();

    let mut buffer = Cursor::new(Vec::new());
    if let Err(err) = DynamicImage::ImageRgb8(crop).write_to(&mut buffer, ImageFormat::Png) {
        warn!(error = %err, "frame encode failed, skipping tick");
        return None;
    }

    Some(CaptureFrame {
        image_bytes: buffer.into_inner(),
        square_size: side,
        timestamp: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(width: u32, height: u32) -> VideoFrame {
        VideoFrame::new(vec![128u8; (width * height * 3) as usize], width, height)
    }

    #[test]
    fn test_square_covers_ratio_of_shorter_dimension() {
        let captured = capture_frame(&frame(1280, 720), 0.9).unwrap();
        assert_eq!(captured.square_size, 648); // 720 * 0.9
    }

    #[test]
    fn test_crop_is_decodable_square_png() {
        let captured = capture_frame(&frame(100, 80), 0.9).unwrap();
        assert_eq!(captured.square_size, 72);

        let decoded = image::load_from_memory(&captured.image_bytes).unwrap();
        assert_eq!(decoded.width(), 72);
        assert_eq!(decoded.height(), 72);
    }

    #[test]
    fn test_portrait_orientation() {
        let captured = capture_frame(&frame(480, 640), 0.5).unwrap();
        assert_eq!(captured.square_size, 240); // 480 * 0.5
    }

    #[test]
    fn test_ratio_is_clamped() {
        // An over-unity ratio must not push the crop out of bounds
        let captured = capture_frame(&frame(64, 48), 1.5).unwrap();
        assert_eq!(captured.square_size, 48);
    }

    #[test]
    fn test_empty_frame_is_skipped() {
        assert!(capture_frame(&VideoFrame::new(Vec::new(), 0, 0), 0.9).is_none());
    }

    #[test]
    fn test_short_pixel_buffer_is_skipped() {
        let malformed = VideoFrame {
            pixels: vec![0u8; 10],
            width: 100,
            height: 80,
        };
        assert!(capture_frame(&malformed, 0.9).is_none());
    }
}
