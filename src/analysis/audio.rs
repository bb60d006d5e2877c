// Audio peak estimation
//
// Takes the maximum magnitude bin rather than the average: short transient
// sounds (a single footstep) must not be smoothed away.

use crate::media::{SpectrumFrame, SPECTRUM_BIN_MAX};

/// Normalized peak loudness of a spectrum buffer, 0..=100.
///
/// An empty buffer scores 0.
pub fn peak_level(frame: &SpectrumFrame) -> f32 {
    let peak = frame.bins.iter().copied().max().unwrap_or(0);
    peak as f32 / SPECTRUM_BIN_MAX as f32 * 100.0
}
