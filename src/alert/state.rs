// AlertCenter - alarm state machine and event log owner
//
// States: Idle (initial) and Alerting. Alerting is left only via explicit
// dismissal or session stop. Every transition that appends an event also
// broadcasts an AlertNotice for the presentation layer.

use std::sync::Mutex;

use tokio::sync::broadcast;

use crate::api::AlarmState;
use crate::verify::VerifierVerdict;

use super::{DetectionEvent, EventLog};

/// Notification fanned out to presentation subscribers on state changes
#[derive(Debug, Clone)]
pub enum AlertNotice {
    /// A new alert fired. `audible` is false when the user muted the alarm;
    /// muting suppresses the sound only, never the transition itself.
    Raised {
        event: DetectionEvent,
        audible: bool,
    },
    /// The live alarm was dismissed; history is untouched
    Dismissed,
}

struct Inner {
    alerting: bool,
    log: EventLog,
}

/// Owns the alarm flag and the bounded event log.
///
/// The log is mutated only through the transition operations below; it
/// persists across session stop/start and is cleared only by `clear_log`.
pub struct AlertCenter {
    inner: Mutex<Inner>,
    notices_tx: broadcast::Sender<AlertNotice>,
}

impl AlertCenter {
    pub fn new(log_capacity: usize, notices_tx: broadcast::Sender<AlertNotice>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                alerting: false,
                log: EventLog::new(log_capacity),
            }),
            notices_tx,
        }
    }

    /// An instantly accepted candidate: append an event and enter Alerting.
    pub fn candidate_accepted(
        &self,
        reason: &str,
        image_jpeg: Vec<u8>,
        timestamp_ms: u64,
        audible: bool,
    ) -> DetectionEvent {
        let event = DetectionEvent::new(reason, image_jpeg, timestamp_ms);
        self.raise(event.clone(), audible);
        event
    }

    /// A verification came back. Positive verdicts raise an alert with the
    /// verifier's reason text; negative verdicts produce no event and no
    /// state change.
    pub fn verifier_confirmed(
        &self,
        verdict: &VerifierVerdict,
        image_jpeg: Vec<u8>,
        timestamp_ms: u64,
        audible: bool,
    ) -> Option<DetectionEvent> {
        if !verdict.is_suspicious {
            log::debug!("[Alert] Negative verification verdict: {}", verdict.reason);
            return None;
        }
        let event = DetectionEvent::new(verdict.reason.clone(), image_jpeg, timestamp_ms);
        self.raise(event.clone(), audible);
        Some(event)
    }

    fn raise(&self, event: DetectionEvent, audible: bool) {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.log.push(event.clone());
            inner.alerting = true;
        }
        log::info!("[Alert] Raised: {}", event.reason);
        let _ = self.notices_tx.send(AlertNotice::Raised { event, audible });
    }

    /// Clear the live alarm; history is untouched.
    pub fn dismiss(&self) {
        let was_alerting = {
            let mut inner = self.inner.lock().unwrap();
            std::mem::replace(&mut inner.alerting, false)
        };
        if was_alerting {
            log::info!("[Alert] Dismissed");
            let _ = self.notices_tx.send(AlertNotice::Dismissed);
        }
    }

    /// Session stopped: reset to Idle. The log persists across sessions.
    pub fn session_stop(&self) {
        self.inner.lock().unwrap().alerting = false;
    }

    /// Drop all history.
    pub fn clear_log(&self) {
        self.inner.lock().unwrap().log.clear();
        log::info!("[Alert] Event log cleared");
    }

    pub fn alarm_state(&self) -> AlarmState {
        if self.inner.lock().unwrap().alerting {
            AlarmState::Alerting
        } else {
            AlarmState::Idle
        }
    }

    pub fn is_alerting(&self) -> bool {
        self.inner.lock().unwrap().alerting
    }

    /// Clone the logged events, newest first.
    pub fn events(&self) -> Vec<DetectionEvent> {
        self.inner.lock().unwrap().log.snapshot()
    }

    pub fn log_len(&self) -> usize {
        self.inner.lock().unwrap().log.len()
    }
}
