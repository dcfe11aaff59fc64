//! Free-running counter abstraction

use isov_core::{TickSource, TICKS_PER_SEC};

use crate::error::{HalError, HalResult};

/// Free-running 32-bit hardware counter
pub trait FreeRunningCounter {
    /// Current counter value; must not block
    fn counter(&self) -> u32;

    /// Counting rate in Hz
    fn rate_hz(&self) -> u32;
}

/// Adapts a 1 MHz [`FreeRunningCounter`] into the core's [`TickSource`]
#[derive(Debug, Clone)]
pub struct CounterClock<C> {
    counter: C,
}

impl<C: FreeRunningCounter> CounterClock<C> {
    /// Wrap `counter`; fails unless it counts microseconds
    pub fn new(counter: C) -> HalResult<Self> {
        if counter.rate_hz() != TICKS_PER_SEC {
            return Err(HalError::NotSupported);
        }
        Ok(Self { counter })
    }
}

impl<C: FreeRunningCounter> TickSource for CounterClock<C> {
    fn read_ticks(&self) -> u32 {
        self.counter.counter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    struct FakeCounter {
        value: Cell<u32>,
        rate: u32,
    }

    impl FreeRunningCounter for FakeCounter {
        fn counter(&self) -> u32 {
            let value = self.value.get();
            self.value.set(value.wrapping_add(5));
            value
        }

        fn rate_hz(&self) -> u32 {
            self.rate
        }
    }

    #[test]
    fn test_counter_clock_reads_counter() {
        let clock = CounterClock::new(FakeCounter {
            value: Cell::new(100),
            rate: 1_000_000,
        })
        .unwrap();
        assert_eq!(clock.read_ticks(), 100);
        assert_eq!(clock.now().raw(), 105);
    }

    #[test]
    fn test_counter_clock_rejects_other_rates() {
        let result = CounterClock::new(FakeCounter {
            value: Cell::new(0),
            rate: 32_768,
        });
        assert_eq!(result.err(), Some(HalError::NotSupported));
    }
}
