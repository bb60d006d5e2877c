//! Alert state machine, detection events, and the bounded event log.

mod event;
mod log;
mod state;

pub use event::{DetectionEvent, INSTANT_MOTION_REASON, INSTANT_SOUND_REASON};
pub use log::EventLog;
pub use state::{AlertCenter, AlertNotice};
