// RasterFrame - fixed-resolution RGBA snapshot of the video track

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};

use crate::error::MediaError;

/// One RGBA raster sample captured at a point in time.
///
/// Ephemeral by design: the pipeline retains at most two (previous and
/// current) and discards the previous once the current has been scored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterFrame {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA, row-major, `width * height * 4` bytes
    pub rgba: Vec<u8>,
}

impl RasterFrame {
    /// Create a frame, validating the buffer length against the dimensions.
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self, MediaError> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(MediaError::StreamFailure {
                reason: format!(
                    "raster buffer length {} does not match {}x{} RGBA ({} bytes)",
                    rgba.len(),
                    width,
                    height,
                    expected
                ),
            });
        }
        Ok(Self {
            width,
            height,
            rgba,
        })
    }

    /// Create a frame filled with a single color (synthetic sources, tests).
    pub fn filled(width: u32, height: u32, color: [u8; 4]) -> Self {
        let mut rgba = Vec::with_capacity(width as usize * height as usize * 4);
        for _ in 0..(width as usize * height as usize) {
            rgba.extend_from_slice(&color);
        }
        Self {
            width,
            height,
            rgba,
        }
    }

    /// Number of pixels in the frame.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Encode the frame as JPEG at the given quality (0..=100).
    ///
    /// JPEG has no alpha channel, so the frame is flattened to RGB first.
    pub fn to_jpeg(&self, quality: u8) -> Result<Vec<u8>, MediaError> {
        let mut rgb = Vec::with_capacity(self.pixel_count() * 3);
        for px in self.rgba.chunks_exact(4) {
            rgb.extend_from_slice(&px[..3]);
        }

        let mut out = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut out, quality);
        encoder.write_image(&rgb, self.width, self.height, ExtendedColorType::Rgb8)?;
        Ok(out)
    }
}
