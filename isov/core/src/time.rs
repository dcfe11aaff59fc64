//! Tick type and the monotonic timer contract

use core::fmt;

/// Timer rate: one tick per microsecond
pub const TICKS_PER_SEC: u32 = 1_000_000;

/// Reading of the free-running 32-bit microsecond counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Ticks(u32);

impl Ticks {
    /// Zero tick
    pub const ZERO: Self = Self(0);

    /// Create a tick value from a raw counter reading
    pub const fn new(ticks: u32) -> Self {
        Self(ticks)
    }

    /// Get the raw counter reading
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Ticks elapsed since `earlier`.
    ///
    /// Uses wrapping subtraction, so the result is correct across one counter
    /// wrap and meaningless across several.
    pub const fn elapsed_since(self, earlier: Ticks) -> u32 {
        self.0.wrapping_sub(earlier.0)
    }

    /// Advance by `ticks`, wrapping at 2^32
    pub const fn wrapping_add(self, ticks: u32) -> Self {
        Self(self.0.wrapping_add(ticks))
    }
}

impl From<u32> for Ticks {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl fmt::Display for Ticks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}us", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Ticks {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{}us", self.0);
    }
}

/// Monotonic timer source.
///
/// Implementations read a free-running counter advancing at [`TICKS_PER_SEC`]
/// and wrapping silently at 2^32. Reads must not block and must be safe to call
/// from interrupt context.
pub trait TickSource {
    /// Current raw counter value
    fn read_ticks(&self) -> u32;

    /// Current counter value as [`Ticks`]
    fn now(&self) -> Ticks {
        Ticks::new(self.read_ticks())
    }
}

/// Fixed or scripted counters, mostly useful on the host
impl<F: Fn() -> u32> TickSource for F {
    fn read_ticks(&self) -> u32 {
        self()
    }
}
