//! Static per-channel calibration coefficients

use core::num::NonZeroU32;

use crate::channel::{ChannelId, CHANNEL_COUNT};

/// Coefficient of the reference converter board: 7692308 / period_us
pub const DEFAULT_COEFFICIENT: i32 = 7_692_308;

/// Per-channel scale factors, `voltage = coefficient / period_ticks`.
///
/// Fixed at startup; the table is never written afterwards and needs no
/// synchronization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationTable {
    coefficients: [i32; CHANNEL_COUNT],
}

impl CalibrationTable {
    /// Table with an explicit coefficient per channel
    pub const fn new(coefficients: [i32; CHANNEL_COUNT]) -> Self {
        Self { coefficients }
    }

    /// Same coefficient on every channel
    pub const fn uniform(coefficient: i32) -> Self {
        Self {
            coefficients: [coefficient; CHANNEL_COUNT],
        }
    }

    /// Coefficient of `channel`
    pub const fn coefficient(&self, channel: ChannelId) -> i32 {
        self.coefficients[channel.index()]
    }

    /// All coefficients in channel order
    pub const fn coefficients(&self) -> &[i32; CHANNEL_COUNT] {
        &self.coefficients
    }

    /// Convert a period into a voltage, truncating toward zero
    pub fn convert(&self, channel: ChannelId, period: NonZeroU32) -> i32 {
        let coefficient = i64::from(self.coefficient(channel));
        // |coefficient / period| <= |coefficient| for any period >= 1
        (coefficient / i64::from(period.get())) as i32
    }
}

impl Default for CalibrationTable {
    fn default() -> Self {
        Self::uniform(DEFAULT_COEFFICIENT)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for CalibrationTable {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{}", self.coefficients);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn period(ticks: u32) -> NonZeroU32 {
        NonZeroU32::new(ticks).unwrap()
    }

    #[test]
    fn test_default_table() {
        let table = CalibrationTable::default();
        for id in ChannelId::all() {
            assert_eq!(table.coefficient(id), DEFAULT_COEFFICIENT);
        }
    }

    #[test]
    fn test_convert_truncates() {
        let table = CalibrationTable::default();
        let ch0 = ChannelId::new(0).unwrap();
        assert_eq!(table.convert(ch0, period(1000)), 7692);
        assert_eq!(table.convert(ch0, period(1)), DEFAULT_COEFFICIENT);
        assert_eq!(table.convert(ch0, period(999_999)), 7);
    }

    #[test]
    fn test_convert_negative_truncates_toward_zero() {
        let table = CalibrationTable::new([-7, 0, i32::MIN, 100, 100]);
        assert_eq!(table.convert(ChannelId::new(0).unwrap(), period(2)), -3);
        assert_eq!(table.convert(ChannelId::new(1).unwrap(), period(5)), 0);
        assert_eq!(table.convert(ChannelId::new(2).unwrap(), period(1)), i32::MIN);
    }
}
