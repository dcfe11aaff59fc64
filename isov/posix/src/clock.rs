//! Host tick source
//!
//! Stands in for the 1 MHz system timer using the monotonic clock. The counter
//! is the number of microseconds since the clock was created, truncated to 32
//! bits, so it wraps exactly like the hardware register.

use std::time::Instant;

use isov_core::TICKS_PER_SEC;
use isov_hal::{CounterClock, FreeRunningCounter};

use crate::error::PortResult;

/// Free-running microsecond counter backed by [`Instant`]
#[derive(Debug, Clone, Copy)]
pub struct MonotonicCounter {
    origin: Instant,
}

impl MonotonicCounter {
    /// Counter reading zero now
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    /// Counter reading zero at `origin`
    pub fn starting_at(origin: Instant) -> Self {
        Self { origin }
    }
}

impl Default for MonotonicCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl FreeRunningCounter for MonotonicCounter {
    fn counter(&self) -> u32 {
        // Truncation is the register wrap
        self.origin.elapsed().as_micros() as u32
    }

    fn rate_hz(&self) -> u32 {
        TICKS_PER_SEC
    }
}

/// Tick source used by the host port
pub type HostClock = CounterClock<MonotonicCounter>;

/// Create a host clock reading zero now
pub fn host_clock() -> PortResult<HostClock> {
    Ok(CounterClock::new(MonotonicCounter::new())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use isov_core::TickSource;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_counter_advances_in_microseconds() {
        let clock = host_clock().unwrap();
        let start = clock.now();
        thread::sleep(Duration::from_millis(20));
        let elapsed = clock.now().elapsed_since(start);
        assert!(elapsed >= 20_000, "elapsed {}us", elapsed);
        assert!(elapsed < 2_000_000, "elapsed {}us", elapsed);
    }

    #[test]
    fn test_counter_wraps_like_register() {
        // Hosts up for less than ~72 minutes cannot go back that far
        let Some(origin) = Instant::now().checked_sub(Duration::from_micros(u64::from(u32::MAX) + 10)) else {
            return;
        };
        let counter = MonotonicCounter::starting_at(origin);
        assert!(counter.counter() < 1_000_000);
    }
}
