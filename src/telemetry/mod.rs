//! Telemetry event types for diagnostics surfaces.

mod events;

pub use events::{MonitorEvent, MonitorEventKind};

/// Current wall-clock time in unix milliseconds.
pub fn unix_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
