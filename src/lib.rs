// Vigil Core - security monitor engine
// Real-time sensor-fusion detection and alert pipeline

// Module declarations
pub mod alert;
pub mod analysis;
pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod managers;
pub mod media;
pub mod telemetry;
pub mod verify;

// Re-exports for convenience
pub use alert::{AlertNotice, DetectionEvent};
pub use api::{AlarmState, MonitorStatus, SignalLevels};
pub use config::{GuardSettings, MonitorConfig};
pub use engine::{MonitorHandle, SettingsPatch};
