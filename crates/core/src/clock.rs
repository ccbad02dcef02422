//! Simulated time source
//!
//! Agent timers (energy, recharge, refill, report expiration) are measured in
//! simulated milliseconds rather than wall-clock time, so that state-machine
//! timeouts are reproducible and testable without sleeping. The agent
//! schedule advances the clock by one agent tick interval per tick.

use crate::core_types::SimMillis;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic simulated clock shared by every component of one run
#[derive(Debug, Default)]
pub struct SimClock {
    now_ms: AtomicU64,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current simulated time
    #[inline]
    pub fn now(&self) -> SimMillis {
        self.now_ms.load(Ordering::Acquire)
    }

    /// Move time forward by `delta_ms` and return the new time
    pub fn advance(&self, delta_ms: SimMillis) -> SimMillis {
        self.now_ms.fetch_add(delta_ms, Ordering::AcqRel) + delta_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_advances() {
        let clock = SimClock::new();
        assert_eq!(clock.now(), 0);
        assert_eq!(clock.advance(400), 400);
        assert_eq!(clock.advance(400), 800);
        assert_eq!(clock.now(), 800);
    }
}
