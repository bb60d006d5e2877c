// Stub verifier used for deterministic testing and CLI tooling.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;

use crate::error::VerifyError;

use super::{Verifier, VerifierVerdict};

/// Canned-verdict [Verifier] with call counting and an optional delay.
pub struct StubVerifier {
    outcome: Result<VerifierVerdict, VerifyError>,
    delay: Duration,
    calls: Arc<AtomicUsize>,
}

impl StubVerifier {
    /// Always answer with the given verdict.
    pub fn with_verdict(is_suspicious: bool, reason: &str) -> Self {
        Self {
            outcome: Ok(VerifierVerdict {
                is_suspicious,
                reason: reason.to_string(),
            }),
            delay: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Always fail with the given error.
    pub fn with_error(error: VerifyError) -> Self {
        Self {
            outcome: Err(error),
            delay: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Delay each answer, simulating a slow remote round-trip.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Shared call counter for assertions.
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Verifier for StubVerifier {
    fn verify(&self, _snapshot: Vec<u8>) -> BoxFuture<'static, Result<VerifierVerdict, VerifyError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let outcome = self.outcome.clone();
        let delay = self.delay;
        Box::pin(async move {
            if delay > Duration::ZERO {
                tokio::time::sleep(delay).await;
            }
            outcome
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stub_returns_canned_verdict() {
        let stub = StubVerifier::with_verdict(true, "person");
        let verdict = stub.verify(vec![]).await.unwrap();

        assert!(verdict.is_suspicious);
        assert_eq!(verdict.reason, "person");
        assert_eq!(stub.calls(), 1);
    }

    #[tokio::test]
    async fn test_stub_returns_canned_error() {
        let stub = StubVerifier::with_error(VerifyError::Timeout);
        let err = stub.verify(vec![]).await.unwrap_err();
        assert_eq!(err, VerifyError::Timeout);
    }
}
