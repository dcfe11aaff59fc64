//! Common error types for HAL operations

use core::fmt;

/// HAL operation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalError {
    /// Operation not supported by this implementation
    NotSupported,
    /// Input line could not be requested
    LineUnavailable(u32),
    /// Input line has no interrupt or the interrupt could not be bound
    InterruptUnavailable(u32),
}

impl fmt::Display for HalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotSupported => write!(f, "operation not supported"),
            Self::LineUnavailable(gpio) => write!(f, "line {} unavailable", gpio),
            Self::InterruptUnavailable(gpio) => write!(f, "no interrupt for line {}", gpio),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for HalError {}

#[cfg(feature = "defmt")]
impl defmt::Format for HalError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::NotSupported => defmt::write!(fmt, "NotSupported"),
            Self::LineUnavailable(gpio) => defmt::write!(fmt, "LineUnavailable({})", gpio),
            Self::InterruptUnavailable(gpio) => defmt::write!(fmt, "InterruptUnavailable({})", gpio),
        }
    }
}

/// Result type for HAL operations
pub type HalResult<T> = Result<T, HalError>;
