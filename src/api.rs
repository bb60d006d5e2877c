//! Presentation-facing readout types.
//!
//! The presentation layer polls or subscribes to these; it never mutates
//! pipeline state through them.

use serde::{Deserialize, Serialize};

/// Current normalized signal levels, published on every pipeline tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalLevels {
    /// Motion score 0..=100 (percentage of sampled pixels changed)
    pub motion_score: f32,
    /// Audio score 0..=100 (peak spectrum bin, normalized)
    pub audio_score: f32,
    /// Milliseconds since session start
    pub timestamp_ms: u64,
}

impl Default for SignalLevels {
    fn default() -> Self {
        Self {
            motion_score: 0.0,
            audio_score: 0.0,
            timestamp_ms: 0,
        }
    }
}

/// Live alarm state of the alert machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlarmState {
    Idle,
    Alerting,
}

/// Point-in-time snapshot of the whole engine for the presentation layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorStatus {
    pub session_active: bool,
    pub motion_score: f32,
    pub audio_score: f32,
    pub alarm: AlarmState,
    /// True when the alarm should currently be audible (alerting and not muted)
    pub alarm_audible: bool,
    /// True while a remote verification is outstanding (loading indicator)
    pub verification_in_flight: bool,
    /// Number of retained detection events
    pub logged_events: usize,
}
