// DetectionEvent - one logged alert

use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};

/// Reason label for instantly accepted motion candidates
pub const INSTANT_MOTION_REASON: &str = "Instant Motion Alert";
/// Reason label for instantly accepted sound candidates
pub const INSTANT_SOUND_REASON: &str = "Instant Sound Alert";

/// One confirmed detection, immutable once created.
///
/// Only suspicious candidates reach the log, so `is_suspicious` is true for
/// every logged event; the field is kept for the presentation contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionEvent {
    /// Unique opaque token
    pub id: String,
    /// Capture time, unix ms
    pub timestamp_ms: u64,
    /// Snapshot encoded as JPEG for display
    pub image_jpeg: Vec<u8>,
    pub is_suspicious: bool,
    /// Fixed instant-alert label, or the verifier's free-text explanation
    pub reason: String,
}

impl DetectionEvent {
    pub fn new(reason: impl Into<String>, image_jpeg: Vec<u8>, timestamp_ms: u64) -> Self {
        Self {
            id: next_event_id(),
            timestamp_ms,
            image_jpeg,
            is_suspicious: true,
            reason: reason.into(),
        }
    }
}

/// Generate an opaque event id token.
fn next_event_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(12)
        .map(char::from)
        .collect()
}
