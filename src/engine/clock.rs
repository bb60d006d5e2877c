// Time sources for the session tick loop.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Trait representing a monotonic time source used for cooldown timing and
/// telemetry timestamps.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> Instant;
}

/// Default time source backed by `Instant::now`.
#[derive(Default)]
pub struct SystemTimeSource {
    _unit: (),
}

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Manually advanced time source for deterministic tests.
///
/// `now()` returns the start instant plus whatever offset has been set;
/// the clock only moves when a test calls `advance` or `set`.
pub struct ManualTimeSource {
    start: Instant,
    offset_ms: AtomicU64,
}

impl ManualTimeSource {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            offset_ms: AtomicU64::new(0),
        }
    }

    /// Move the clock forward by `ms`.
    pub fn advance(&self, ms: u64) {
        self.offset_ms.fetch_add(ms, Ordering::SeqCst);
    }

    /// Jump the clock to an absolute offset from start.
    pub fn set(&self, ms: u64) {
        self.offset_ms.store(ms, Ordering::SeqCst);
    }
}

impl Default for ManualTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> Instant {
        let ms = self.offset_ms.load(Ordering::SeqCst);
        self.start + Duration::from_millis(ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_only_moves_when_told() {
        let clock = ManualTimeSource::new();
        let a = clock.now();
        let b = clock.now();
        assert_eq!(a, b);

        clock.advance(250);
        assert_eq!(clock.now() - a, Duration::from_millis(250));

        clock.set(1000);
        assert_eq!(clock.now() - a, Duration::from_millis(1000));
    }
}
