//! Configuration management for the monitor engine
//!
//! This module provides runtime configuration loading from JSON files,
//! enabling parameter tuning without recompilation. Detection cadence,
//! cooldown windows, verifier endpoint, and log capacity can all be
//! adjusted via the config file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Sensitivity sliders accept 1..=99; anything outside is clamped.
pub const SENSITIVITY_MIN: u8 = 1;
pub const SENSITIVITY_MAX: u8 = 99;

/// Complete engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub pipeline: PipelineConfig,
    pub verifier: VerifierConfig,
    pub events: EventLogConfig,
}

/// Detection pipeline timing and scoring parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Scheduler tick interval in ms (approximates the host redraw rate)
    pub tick_interval_ms: u64,
    /// Minimum interval between raster samples / motion scoring
    pub motion_interval_ms: u64,
    /// Cooldown window between accepted candidates without smart guard
    pub instant_cooldown_ms: u64,
    /// Cooldown window between accepted candidates with smart guard
    pub guarded_cooldown_ms: u64,
    /// Sample every Nth pixel when diffing rasters
    pub pixel_stride: usize,
    /// Summed RGB channel difference (0..=765) above which a pixel counts as changed
    pub pixel_noise_floor: u32,
    /// JPEG quality (0..=100) for alert snapshots
    pub snapshot_jpeg_quality: u8,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 16,
            motion_interval_ms: 100,
            instant_cooldown_ms: 300,
            // Longer window when smart guard is on: each acceptance spawns a
            // remote verification.
            guarded_cooldown_ms: 1000,
            pixel_stride: 4,
            pixel_noise_floor: 45,
            snapshot_jpeg_quality: 50,
        }
    }
}

/// Remote classification endpoint parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// URL of the classification service
    pub endpoint: String,
    /// Instruction sent along with every snapshot
    pub instruction: String,
    /// Request timeout in ms
    pub timeout_ms: u64,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            instruction: "does this frame show a human being".to_string(),
            timeout_ms: 10_000,
        }
    }
}

/// Event log parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogConfig {
    /// Maximum retained detection events; oldest evicted past this
    pub capacity: usize,
}

impl Default for EventLogConfig {
    fn default() -> Self {
        Self { capacity: 50 }
    }
}

impl Default for MonitorConfig {
    /// Default configuration values (fallback if config file not found)
    fn default() -> Self {
        Self {
            pipeline: PipelineConfig::default(),
            verifier: VerifierConfig::default(),
            events: EventLogConfig::default(),
        }
    }
}

impl MonitorConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// Loaded configuration, or defaults if the file is missing or invalid.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }
}

/// User-tunable guard settings, written by the presentation layer and read
/// by the pipeline each tick.
///
/// Sensitivities are stored clamped to 1..=99. `muted` suppresses the
/// audible alarm only; it never affects detection or state transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardSettings {
    pub motion_sensitivity: u8,
    pub audio_sensitivity: u8,
    pub smart_guard: bool,
    pub muted: bool,
}

impl Default for GuardSettings {
    fn default() -> Self {
        Self {
            motion_sensitivity: 50,
            audio_sensitivity: 50,
            smart_guard: false,
            muted: false,
        }
    }
}

impl GuardSettings {
    /// Clamp a slider value into the accepted 1..=99 range.
    ///
    /// Sliders are the only input path, so out-of-range values are clamped
    /// rather than rejected.
    pub fn clamp_sensitivity(value: u8) -> u8 {
        value.clamp(SENSITIVITY_MIN, SENSITIVITY_MAX)
    }
}
