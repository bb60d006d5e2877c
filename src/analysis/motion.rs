// MotionEstimator - stride-sampled frame differencing
//
// Compares consecutive RGBA rasters and produces a normalized motion score.
// This is deliberately a cheap, allocation-light scalar estimator rather
// than object detection: it runs on every motion-cadence tick, and the
// expensive semantic check is delegated to the remote verifier.
//
// Algorithm:
// 1. Sample every Nth pixel of the linear pixel array (stride 4 by default)
// 2. Sum the absolute per-channel R, G, B differences for each sampled pixel
// 3. Count the pixel as changed when the sum exceeds the noise floor
//    (45 of a possible 765)
// 4. Score = changed / sampled * 100

use crate::config::PipelineConfig;
use crate::media::RasterFrame;

/// Scores motion between consecutive raster samples
#[derive(Debug, Clone)]
pub struct MotionEstimator {
    stride: usize,
    noise_floor: u32,
}

impl MotionEstimator {
    pub fn new(stride: usize, noise_floor: u32) -> Self {
        Self {
            stride: stride.max(1),
            noise_floor,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.pixel_stride, config.pixel_noise_floor)
    }

    /// Score the difference between two consecutive frames, 0..=100.
    ///
    /// Mismatched dimensions (a mid-session resolution change) score 0 —
    /// the pair carries no usable signal.
    pub fn score(&self, previous: &RasterFrame, current: &RasterFrame) -> f32 {
        if previous.width != current.width || previous.height != current.height {
            log::debug!(
                "[Motion] Frame size changed {}x{} -> {}x{}, skipping pair",
                previous.width,
                previous.height,
                current.width,
                current.height
            );
            return 0.0;
        }

        let pixel_count = current.pixel_count();
        if pixel_count == 0 {
            return 0.0;
        }

        let mut sampled = 0u32;
        let mut changed = 0u32;

        for px in (0..pixel_count).step_by(self.stride) {
            let offset = px * 4;
            let prev = &previous.rgba[offset..offset + 3];
            let curr = &current.rgba[offset..offset + 3];

            let diff = prev[0].abs_diff(curr[0]) as u32
                + prev[1].abs_diff(curr[1]) as u32
                + prev[2].abs_diff(curr[2]) as u32;

            sampled += 1;
            if diff > self.noise_floor {
                changed += 1;
            }
        }

        let score = changed as f32 / sampled as f32 * 100.0;
        score.clamp(0.0, 100.0)
    }
}
