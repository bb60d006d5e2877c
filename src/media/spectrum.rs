// SpectrumAnalyzer - frequency-magnitude buffers from raw PCM
//
// Converts a PCM window into byte-valued magnitude bins the way browser
// audio analysers expose them: Hann window, FFT magnitude, dB conversion,
// then a linear map of [-100 dB, -30 dB] onto 0..=255.

use rustfft::{num_complex::Complex, FftPlanner};
use std::sync::{Arc, Mutex};

/// Maximum representable bin magnitude; audio scores normalize against this.
pub const SPECTRUM_BIN_MAX: u8 = 255;

/// dB floor mapped to bin value 0
const MIN_DB: f32 = -100.0;
/// dB ceiling mapped to bin value 255
const MAX_DB: f32 = -30.0;

/// One frequency-magnitude sample of the audio track.
///
/// Ephemeral: recomputed each tick, never retained.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpectrumFrame {
    /// Magnitude bins, 0 = silence, 255 = maximum representable magnitude
    pub bins: Vec<u8>,
}

impl SpectrumFrame {
    pub fn new(bins: Vec<u8>) -> Self {
        Self { bins }
    }

    /// An all-silent buffer with the given bin count.
    pub fn silent(bin_count: usize) -> Self {
        Self {
            bins: vec![0; bin_count],
        }
    }
}

/// Computes magnitude spectra from PCM windows
pub struct SpectrumAnalyzer {
    fft_planner: Arc<Mutex<FftPlanner<f32>>>,
    fft_size: usize,
    // Hann window, pre-computed
    window: Vec<f32>,
}

impl SpectrumAnalyzer {
    /// Create a new analyzer
    ///
    /// # Arguments
    /// * `fft_size` - FFT window size (typically 1024)
    pub fn new(fft_size: usize) -> Self {
        let fft_size = fft_size.max(2);

        // Pre-compute Hann window to reduce spectral leakage
        let window = (0..fft_size)
            .map(|i| {
                0.5 * (1.0
                    - ((2.0 * std::f32::consts::PI * i as f32) / (fft_size as f32 - 1.0)).cos())
            })
            .collect();

        Self {
            fft_planner: Arc::new(Mutex::new(FftPlanner::new())),
            fft_size,
            window,
        }
    }

    /// Number of bins produced per frame.
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2 + 1
    }

    /// Compute a byte-valued magnitude spectrum from a PCM window.
    ///
    /// Input shorter than the FFT size is zero-padded; input longer is
    /// truncated. Samples are expected in [-1.0, 1.0].
    pub fn compute(&self, samples: &[f32]) -> SpectrumFrame {
        let mut buffer: Vec<Complex<f32>> = Vec::with_capacity(self.fft_size);

        for (i, &sample) in samples.iter().enumerate() {
            if i < self.fft_size {
                buffer.push(Complex::new(sample * self.window[i], 0.0));
            }
        }
        while buffer.len() < self.fft_size {
            buffer.push(Complex::new(0.0, 0.0));
        }

        let mut planner = self.fft_planner.lock().unwrap();
        let fft = planner.plan_fft_forward(self.fft_size);
        fft.process(&mut buffer);
        drop(planner);

        // Positive frequencies only; normalize magnitude by window length
        // before dB conversion.
        let scale = 2.0 / self.fft_size as f32;
        let bins = buffer[..self.bin_count()]
            .iter()
            .map(|c| {
                let magnitude = c.norm() * scale;
                let db = if magnitude > 0.0 {
                    20.0 * magnitude.log10()
                } else {
                    MIN_DB
                };
                let normalized = (db - MIN_DB) / (MAX_DB - MIN_DB);
                (normalized.clamp(0.0, 1.0) * SPECTRUM_BIN_MAX as f32).round() as u8
            })
            .collect();

        SpectrumFrame::new(bins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Generate a sine tone at the given bin frequency
    fn generate_tone(fft_size: usize, cycles: usize, amplitude: f32) -> Vec<f32> {
        (0..fft_size)
            .map(|i| {
                amplitude
                    * (2.0 * std::f32::consts::PI * cycles as f32 * i as f32 / fft_size as f32)
                        .sin()
            })
            .collect()
    }

    #[test]
    fn test_silence_yields_zero_bins() {
        let analyzer = SpectrumAnalyzer::new(256);
        let frame = analyzer.compute(&vec![0.0; 256]);

        assert_eq!(frame.bins.len(), analyzer.bin_count());
        assert!(frame.bins.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_full_scale_tone_peaks_near_its_bin() {
        let analyzer = SpectrumAnalyzer::new(256);
        let tone = generate_tone(256, 16, 1.0);
        let frame = analyzer.compute(&tone);

        let (peak_bin, &peak) = frame
            .bins
            .iter()
            .enumerate()
            .max_by_key(|(_, &b)| b)
            .unwrap();

        // Energy should concentrate at bin 16 (allow leakage into neighbors)
        assert!(
            (15..=17).contains(&peak_bin),
            "peak at bin {}, expected near 16",
            peak_bin
        );
        // A full-scale tone sits well above the -30 dB ceiling
        assert_eq!(peak, SPECTRUM_BIN_MAX);
    }

    #[test]
    fn test_quiet_tone_stays_below_ceiling() {
        let analyzer = SpectrumAnalyzer::new(256);
        // -80 dB amplitude: inside the mapped range but far from the ceiling
        let tone = generate_tone(256, 16, 1e-4);
        let frame = analyzer.compute(&tone);

        let peak = *frame.bins.iter().max().unwrap();
        assert!(peak > 0, "quiet tone should register above silence");
        assert!(
            peak < SPECTRUM_BIN_MAX,
            "quiet tone should not saturate, got {}",
            peak
        );
    }

    #[test]
    fn test_short_input_zero_padded() {
        let analyzer = SpectrumAnalyzer::new(256);
        let frame = analyzer.compute(&[0.5; 32]);
        assert_eq!(frame.bins.len(), 129);
    }
}
