//! Core telemetry event types describing engine lifecycle and alert
//! activity for diagnostics and presentation surfaces.

use serde::{Deserialize, Serialize};

/// Telemetry event emitted by the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorEvent {
    pub timestamp_ms: u64,
    pub kind: MonitorEventKind,
    pub detail: Option<String>,
}

/// Types of telemetry events supported by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MonitorEventKind {
    SessionStarted,
    SessionStopped,
    AlertRaised { reason: String },
    AlertDismissed,
    VerificationStarted,
    VerificationFailed,
    LogCleared,
    SettingsChanged,
    Warning,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serializes_tagged_snake_case() {
        let kind = MonitorEventKind::AlertRaised {
            reason: "Instant Motion Alert".to_string(),
        };
        let json = serde_json::to_string(&kind).unwrap();
        assert!(json.contains("\"type\":\"alert_raised\""));
        assert!(json.contains("Instant Motion Alert"));
    }
}
