// Synthetic media source used for deterministic testing and CLI tooling.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::error::MediaError;

use super::{MediaSource, RasterFrame, SpectrumAnalyzer, SpectrumFrame};

const BASE_COLOR: [u8; 4] = [16, 16, 16, 255];
const FLICKER_COLOR: [u8; 4] = [216, 216, 216, 255];

/// Scripted scene state behind the synthetic source.
#[derive(Debug, Clone)]
struct Scene {
    frame_counter: u64,
    /// Fraction of pixels (0.0..=1.0) toggling between captures
    motion_fraction: f32,
    /// Sine amplitude (0.0..=1.0) of the injected tone
    tone_amplitude: f32,
    /// Tone frequency in FFT bin cycles
    tone_cycles: usize,
}

/// Deterministic [MediaSource] producing a programmable scene.
///
/// While `motion_fraction` is non-zero, that share of pixels flips between
/// two colors on every capture, so consecutive rasters keep differing.
/// While `tone_amplitude` is non-zero, the spectrum carries a sine tone at
/// `tone_cycles`; otherwise it is silent.
pub struct SyntheticMediaSource {
    running: AtomicBool,
    width: u32,
    height: u32,
    analyzer: SpectrumAnalyzer,
    scene: Mutex<Scene>,
}

impl SyntheticMediaSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            running: AtomicBool::new(false),
            width,
            height,
            analyzer: SpectrumAnalyzer::new(1024),
            scene: Mutex::new(Scene {
                frame_counter: 0,
                motion_fraction: 0.0,
                tone_amplitude: 0.0,
                tone_cycles: 64,
            }),
        }
    }

    /// Start toggling the given fraction of pixels every capture.
    pub fn set_motion(&self, fraction: f32) {
        self.scene.lock().unwrap().motion_fraction = fraction.clamp(0.0, 1.0);
    }

    /// Inject a sine tone of the given amplitude into the spectrum.
    pub fn set_tone(&self, amplitude: f32) {
        self.scene.lock().unwrap().tone_amplitude = amplitude.clamp(0.0, 1.0);
    }

    /// Silence both signal paths.
    pub fn quiet(&self) {
        let mut scene = self.scene.lock().unwrap();
        scene.motion_fraction = 0.0;
        scene.tone_amplitude = 0.0;
    }
}

impl MediaSource for SyntheticMediaSource {
    fn start(&self) -> Result<(), MediaError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(MediaError::AlreadyRunning);
        }
        Ok(())
    }

    fn stop(&self) -> Result<(), MediaError> {
        if !self.running.swap(false, Ordering::SeqCst) {
            return Err(MediaError::NotRunning);
        }
        Ok(())
    }

    fn capture_frame(&self) -> Result<RasterFrame, MediaError> {
        if !self.running.load(Ordering::SeqCst) {
            return Err(MediaError::NotRunning);
        }

        let mut scene = self.scene.lock().unwrap();
        let mut frame = RasterFrame::filled(self.width, self.height, BASE_COLOR);

        let moving_pixels =
            (frame.pixel_count() as f32 * scene.motion_fraction).round() as usize;
        if moving_pixels > 0 && scene.frame_counter % 2 == 1 {
            for px in 0..moving_pixels.min(frame.pixel_count()) {
                let offset = px * 4;
                frame.rgba[offset..offset + 4].copy_from_slice(&FLICKER_COLOR);
            }
        }

        scene.frame_counter += 1;
        Ok(frame)
    }

    fn capture_spectrum(&self) -> Result<SpectrumFrame, MediaError> {
        if !self.running.load(Ordering::SeqCst) {
            return Err(MediaError::NotRunning);
        }

        let scene = self.scene.lock().unwrap();
        if scene.tone_amplitude <= 0.0 {
            return Ok(SpectrumFrame::silent(self.analyzer.bin_count()));
        }

        let samples: Vec<f32> = (0..1024)
            .map(|i| {
                scene.tone_amplitude
                    * (2.0
                        * std::f32::consts::PI
                        * scene.tone_cycles as f32
                        * i as f32
                        / 1024.0)
                        .sin()
            })
            .collect();
        Ok(self.analyzer.compute(&samples))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_requires_start() {
        let source = SyntheticMediaSource::new(8, 8);
        assert!(matches!(
            source.capture_frame(),
            Err(MediaError::NotRunning)
        ));

        source.start().unwrap();
        assert!(source.capture_frame().is_ok());
    }

    #[test]
    fn test_double_start_rejected() {
        let source = SyntheticMediaSource::new(8, 8);
        source.start().unwrap();
        assert!(matches!(source.start(), Err(MediaError::AlreadyRunning)));
    }

    #[test]
    fn test_quiet_scene_produces_identical_frames() {
        let source = SyntheticMediaSource::new(8, 8);
        source.start().unwrap();

        let a = source.capture_frame().unwrap();
        let b = source.capture_frame().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_motion_fraction_toggles_pixels() {
        let source = SyntheticMediaSource::new(8, 8);
        source.start().unwrap();
        source.set_motion(0.5);

        let a = source.capture_frame().unwrap();
        let b = source.capture_frame().unwrap();
        assert_ne!(a, b);

        // Half the pixels should differ between consecutive captures
        let differing = a
            .rgba
            .chunks_exact(4)
            .zip(b.rgba.chunks_exact(4))
            .filter(|(x, y)| x != y)
            .count();
        assert_eq!(differing, 32);
    }

    #[test]
    fn test_tone_registers_in_spectrum() {
        let source = SyntheticMediaSource::new(8, 8);
        source.start().unwrap();

        let silent = source.capture_spectrum().unwrap();
        assert!(silent.bins.iter().all(|&b| b == 0));

        source.set_tone(1.0);
        let loud = source.capture_spectrum().unwrap();
        assert!(*loud.bins.iter().max().unwrap() > 200);
    }
}
