//! Remote verification seam and the single-flight guard.
//!
//! Smart-guard candidates must pass a remote image classification before
//! they become logged alerts. The engine talks to the service through the
//! [Verifier] trait; at most one verification is outstanding system-wide.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::error::VerifyError;

mod remote;
mod stub;

pub use remote::RemoteVerifier;
pub use stub::StubVerifier;

/// Verdict returned by the classification service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifierVerdict {
    pub is_suspicious: bool,
    pub reason: String,
}

/// Trait implemented by snapshot classifiers.
///
/// Failure is never fatal: callers degrade any `Err` to a negative
/// classification and do not retry for that candidate.
pub trait Verifier: Send + Sync {
    /// Classify a JPEG snapshot. The future must be independent of `self`
    /// so it can be spawned without blocking the tick loop.
    fn verify(&self, snapshot: Vec<u8>) -> BoxFuture<'static, Result<VerifierVerdict, VerifyError>>;
}

/// Single-flight admission for verifications.
///
/// `try_begin` hands out a [FlightGuard] only while no other flight is
/// outstanding; candidates that find a flight in progress are dropped,
/// never queued.
#[derive(Debug, Clone, Default)]
pub struct SingleFlight {
    in_flight: Arc<AtomicBool>,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the flight slot. Returns `None` if a flight is outstanding.
    pub fn try_begin(&self) -> Option<FlightGuard> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            Some(FlightGuard {
                flag: Arc::clone(&self.in_flight),
            })
        } else {
            None
        }
    }

    /// Whether a verification is currently outstanding (loading indicator).
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }
}

/// Releases the flight slot on drop, so the in-flight flag can never be
/// left set after a failed or panicked verification.
#[derive(Debug)]
pub struct FlightGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
