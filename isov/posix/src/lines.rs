//! Simulated converter lines
//!
//! [`SimulatedLines`] plays the GPIO controller on the host. Each requested
//! line shares a [`LineSignal`] with whatever drives it (see
//! [`crate::pulse`]), so the driver can observe whether the falling-edge
//! interrupt is armed and move the line level.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use isov_hal::{Edge, HalError, HalResult, InputLine, InterruptLine, Level, LineProvider};
use log::debug;

/// State shared between a simulated line and its driver
#[derive(Debug)]
pub struct LineSignal {
    gpio: u32,
    armed: AtomicBool,
    high: AtomicBool,
}

impl LineSignal {
    fn new(gpio: u32) -> Self {
        Self {
            gpio,
            armed: AtomicBool::new(false),
            high: AtomicBool::new(true),
        }
    }

    /// GPIO number of the line
    pub fn gpio(&self) -> u32 {
        self.gpio
    }

    /// Check if a falling-edge interrupt is armed
    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }

    /// Drive the line level; returns true on a high-to-low transition
    pub fn drive(&self, level: Level) -> bool {
        let high = level == Level::High;
        let was_high = self.high.swap(high, Ordering::AcqRel);
        was_high && !high
    }

    fn level(&self) -> Level {
        if self.high.load(Ordering::Acquire) {
            Level::High
        } else {
            Level::Low
        }
    }
}

/// Simulated input line handed out by [`SimulatedLines`]
#[derive(Debug)]
pub struct SimLine {
    signal: Arc<LineSignal>,
    interrupt: bool,
}

impl InputLine for SimLine {
    fn read(&self) -> HalResult<Level> {
        Ok(self.signal.level())
    }

    fn pin_number(&self) -> u32 {
        self.signal.gpio
    }
}

impl InterruptLine for SimLine {
    fn enable_interrupt(&mut self, edge: Edge) -> HalResult<()> {
        if !self.interrupt {
            return Err(HalError::InterruptUnavailable(self.signal.gpio));
        }
        if edge != Edge::Falling {
            return Err(HalError::NotSupported);
        }
        self.signal.armed.store(true, Ordering::Release);
        Ok(())
    }

    fn disable_interrupt(&mut self) -> HalResult<()> {
        self.signal.armed.store(false, Ordering::Release);
        Ok(())
    }

    fn is_interrupt_enabled(&self) -> bool {
        self.signal.is_armed()
    }
}

/// Host stand-in for the GPIO controller
#[derive(Debug, Default)]
pub struct SimulatedLines {
    claimed: HashMap<u32, Arc<LineSignal>>,
    unavailable: HashSet<u32>,
    no_interrupt: HashSet<u32>,
}

impl SimulatedLines {
    /// Controller where every line is free
    pub fn new() -> Self {
        Self::default()
    }

    /// Make requests for `gpio` fail, as if another driver owned it
    pub fn with_unavailable(mut self, gpio: u32) -> Self {
        self.unavailable.insert(gpio);
        self
    }

    /// Make arming `gpio` fail, as if it had no interrupt
    pub fn without_interrupt(mut self, gpio: u32) -> Self {
        self.no_interrupt.insert(gpio);
        self
    }

    /// Signal of a claimed line
    pub fn signal(&self, gpio: u32) -> Option<Arc<LineSignal>> {
        self.claimed.get(&gpio).cloned()
    }

    /// Number of lines currently claimed
    pub fn claimed(&self) -> usize {
        self.claimed.len()
    }
}

impl LineProvider for SimulatedLines {
    type Line = SimLine;

    fn request(&mut self, gpio: u32, label: &str) -> HalResult<SimLine> {
        if self.unavailable.contains(&gpio) || self.claimed.contains_key(&gpio) {
            return Err(HalError::LineUnavailable(gpio));
        }
        debug!("GPIO {} claimed as '{}'", gpio, label);
        let signal = Arc::new(LineSignal::new(gpio));
        self.claimed.insert(gpio, Arc::clone(&signal));
        Ok(SimLine {
            signal,
            interrupt: !self.no_interrupt.contains(&gpio),
        })
    }

    fn release(&mut self, line: SimLine) {
        debug!("GPIO {} released", line.signal.gpio);
        self.claimed.remove(&line.signal.gpio);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_and_release() {
        let mut lines = SimulatedLines::new();
        let mut line = lines.request(2, "Voltage to freq 1").unwrap();
        assert_eq!(lines.claimed(), 1);
        assert_eq!(line.read(), Ok(Level::High));
        assert!(lines.request(2, "again").is_err());

        line.enable_interrupt(Edge::Falling).unwrap();
        assert!(lines.signal(2).unwrap().is_armed());
        assert_eq!(line.enable_interrupt(Edge::Rising), Err(HalError::NotSupported));

        line.disable_interrupt().unwrap();
        lines.release(line);
        assert_eq!(lines.claimed(), 0);
        assert!(lines.signal(2).is_none());
    }

    #[test]
    fn test_drive_reports_falling_edges() {
        let signal = LineSignal::new(5);
        assert!(!signal.drive(Level::High));
        assert!(signal.drive(Level::Low));
        assert!(!signal.drive(Level::Low));
        assert!(!signal.drive(Level::High));
        assert!(signal.drive(Level::Low));
    }

    #[test]
    fn test_unavailable_and_interruptless_lines() {
        let mut lines = SimulatedLines::new().with_unavailable(22).without_interrupt(10);
        assert_eq!(lines.request(22, "x").err(), Some(HalError::LineUnavailable(22)));

        let mut line = lines.request(10, "y").unwrap();
        assert_eq!(
            line.enable_interrupt(Edge::Falling),
            Err(HalError::InterruptUnavailable(10))
        );
    }
}
