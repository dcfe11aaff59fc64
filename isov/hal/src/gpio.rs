//! Input line abstraction

use crate::error::HalResult;

/// GPIO pin levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Low level (0V)
    Low,
    /// High level (VCC)
    High,
}

/// Interrupt trigger edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// Rising edge
    Rising,
    /// Falling edge
    Falling,
    /// Both edges
    Both,
}

/// Input line (object-safe)
pub trait InputLine: Send {
    /// Read current level
    fn read(&self) -> HalResult<Level>;

    /// Get GPIO number
    fn pin_number(&self) -> u32;
}

/// Input line with interrupt support
pub trait InterruptLine: InputLine {
    /// Enable interrupt on edge
    fn enable_interrupt(&mut self, edge: Edge) -> HalResult<()>;

    /// Disable interrupt
    fn disable_interrupt(&mut self) -> HalResult<()>;

    /// Check if interrupt is enabled
    fn is_interrupt_enabled(&self) -> bool;
}

/// Source of input lines (GPIO controller or its host stand-in)
pub trait LineProvider {
    /// Line type handed out by this provider
    type Line: InterruptLine;

    /// Claim `gpio` as an input, tagged with a consumer `label`
    fn request(&mut self, gpio: u32, label: &str) -> HalResult<Self::Line>;

    /// Give a claimed line back
    fn release(&mut self, line: Self::Line);
}
