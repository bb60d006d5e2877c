// TriggerGate - threshold and cooldown gating for candidate events
//
// Combines the current motion/audio scores with the user's sensitivity
// settings and a shared cooldown clock. Both signal paths share the one
// clock, so at most one acceptance (and thus at most one verification)
// happens per cooldown window; audio is evaluated first and wins the tick.

use crate::config::{GuardSettings, PipelineConfig};

/// Outcome of gating one tick's scores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Nothing crossed its threshold, or the cooldown window is still open
    None,
    /// Motion score crossed the motion threshold
    MotionCandidate,
    /// Audio score crossed the audio threshold
    AudioCandidate,
}

/// Evaluates candidate events against thresholds and the cooldown clock
#[derive(Debug, Clone)]
pub struct TriggerGate {
    instant_cooldown_ms: u64,
    guarded_cooldown_ms: u64,
}

impl TriggerGate {
    pub fn new(instant_cooldown_ms: u64, guarded_cooldown_ms: u64) -> Self {
        Self {
            instant_cooldown_ms,
            guarded_cooldown_ms,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.instant_cooldown_ms, config.guarded_cooldown_ms)
    }

    /// Motion threshold derived from a sensitivity slider.
    ///
    /// The 0.5 floor means even at maximum sensitivity at least 0.5% of
    /// sampled pixels must change, so sensor noise alone cannot fire.
    pub fn motion_threshold(sensitivity: u8) -> f32 {
        (((100 - sensitivity as i32) as f32) / 2.0).max(0.5)
    }

    /// Audio threshold derived from a sensitivity slider.
    pub fn audio_threshold(sensitivity: u8) -> f32 {
        (100 - sensitivity as i32) as f32
    }

    /// Gate one tick's scores.
    ///
    /// `last_detection_ms` is the shared cooldown clock; `None` means no
    /// detection has been accepted this session. On acceptance the caller
    /// must update the clock immediately, before any verification outcome
    /// is known.
    pub fn evaluate(
        &self,
        motion_score: f32,
        audio_score: f32,
        now_ms: u64,
        settings: &GuardSettings,
        last_detection_ms: Option<u64>,
    ) -> GateDecision {
        let window = if settings.smart_guard {
            self.guarded_cooldown_ms
        } else {
            self.instant_cooldown_ms
        };

        let cooled_down = match last_detection_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) > window,
        };
        if !cooled_down {
            return GateDecision::None;
        }

        if audio_score > Self::audio_threshold(settings.audio_sensitivity) {
            return GateDecision::AudioCandidate;
        }
        if motion_score > Self::motion_threshold(settings.motion_sensitivity) {
            return GateDecision::MotionCandidate;
        }
        GateDecision::None
    }
}
