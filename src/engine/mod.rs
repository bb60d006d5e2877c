//! Session engine: orchestration handle, tick pipeline, and time sources.

mod clock;
mod handle;
mod session;

pub use clock::{ManualTimeSource, SystemTimeSource, TimeSource};
pub use handle::{MonitorHandle, SettingsPatch};
