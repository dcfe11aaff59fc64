//! Period-to-voltage engine
//!
//! [`Meter`] owns the five guarded channel states and the [`CalibrationTable`]. The
//! edge path calls [`Meter::on_edge`]; readers call [`Meter::readings`] or
//! capture a [`Snapshot`](crate::Snapshot). A `Meter` can be placed in a
//! `static` since [`Meter::new`] is `const`.

use core::num::NonZeroU32;

use crate::calibration::CalibrationTable;
use crate::channel::{ChannelId, ChannelReading, ChannelState, CHANNEL_COUNT};
use crate::config::MeterConfig;
use crate::time::{TickSource, Ticks};

/// Periods at or above this many ticks (1 Hz) are discarded
pub const PERIOD_LIMIT_TICKS: u32 = 1_000_000;

/// Validity policy for a measured period.
///
/// Zero periods and periods of a second or more are rejected.
#[inline]
pub fn accept_period(period: u32) -> Option<NonZeroU32> {
    NonZeroU32::new(period).filter(|p| p.get() < PERIOD_LIMIT_TICKS)
}

/// What an edge did to its channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeOutcome {
    /// Period accepted, voltage replaced
    Accepted { period: u32, voltage: i32 },
    /// Period discarded, previous voltage kept
    Rejected { period: u32 },
}

impl EdgeOutcome {
    /// Measured period, accepted or not
    pub const fn period(&self) -> u32 {
        match self {
            Self::Accepted { period, .. } | Self::Rejected { period } => *period,
        }
    }

    /// Check if the voltage was updated
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for EdgeOutcome {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Accepted { period, voltage } => {
                defmt::write!(fmt, "Accepted(period={}, voltage={})", period, voltage)
            }
            Self::Rejected { period } => defmt::write!(fmt, "Rejected(period={})", period),
        }
    }
}

/// Channel-state aggregate plus calibration.
///
/// Channel state is only written by [`Meter::on_edge`]; everything else gets
/// copies.
///
/// ```compile_fail
/// let meter = isov_core::Meter::default();
/// meter.channels()[0].update(|reading| reading.voltage = 1);
/// ```
///
/// ```compile_fail
/// let meter = isov_core::Meter::default();
/// meter.reset();
/// ```
#[derive(Debug)]
pub struct Meter {
    channels: [ChannelState; CHANNEL_COUNT],
    calibration: CalibrationTable,
}

impl Meter {
    /// Create a meter with every channel at `voltage = 0`, `last_edge = 0`
    pub const fn new(calibration: CalibrationTable) -> Self {
        Self {
            channels: [
                ChannelState::new(ChannelId::FIRST),
                ChannelState::new(ChannelId::SECOND),
                ChannelState::new(ChannelId::THIRD),
                ChannelState::new(ChannelId::FOURTH),
                ChannelState::new(ChannelId::FIFTH),
            ],
            calibration,
        }
    }

    /// Create a meter from a validated configuration
    pub fn from_config(config: &MeterConfig) -> Self {
        Self::new(config.calibration)
    }

    /// Calibration in use
    pub const fn calibration(&self) -> &CalibrationTable {
        &self.calibration
    }

    /// Process a falling edge on `channel` observed at `now`.
    ///
    /// The timestamp is always stored; the voltage only changes when the period
    /// passes [`accept_period`]. Bounded work, no allocation, no blocking.
    pub fn on_edge(&self, channel: ChannelId, now: Ticks) -> EdgeOutcome {
        let calibration = &self.calibration;
        self.channels[channel.index()].update(|reading| {
            let period = now.elapsed_since(reading.last_edge);
            reading.last_edge = now;

            match accept_period(period) {
                Some(valid) => {
                    reading.voltage = calibration.convert(channel, valid);
                    EdgeOutcome::Accepted {
                        period,
                        voltage: reading.voltage,
                    }
                }
                None => EdgeOutcome::Rejected { period },
            }
        })
    }

    /// Process a falling edge, timestamping it with `timer`
    pub fn on_edge_at<T: TickSource + ?Sized>(&self, channel: ChannelId, timer: &T) -> EdgeOutcome {
        self.on_edge(channel, timer.now())
    }

    /// Consistent copy of one channel
    pub fn reading(&self, channel: ChannelId) -> ChannelReading {
        self.channels[channel.index()].load()
    }

    /// Per-channel consistent copies of all channels.
    ///
    /// Each pair is atomic on its own; no cross-channel atomicity is implied.
    pub fn readings(&self) -> [ChannelReading; CHANNEL_COUNT] {
        let mut out = [ChannelReading::INITIAL; CHANNEL_COUNT];
        for (slot, channel) in out.iter_mut().zip(self.channels.iter()) {
            *slot = channel.load();
        }
        out
    }

    /// Current voltage of every channel
    pub fn voltages(&self) -> [i32; CHANNEL_COUNT] {
        self.readings().map(|reading| reading.voltage)
    }
}

impl Default for Meter {
    fn default() -> Self {
        Self::new(CalibrationTable::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::DEFAULT_COEFFICIENT;

    fn ch(index: u8) -> ChannelId {
        ChannelId::new(index).unwrap()
    }

    #[test]
    fn test_accept_period_policy() {
        assert_eq!(accept_period(0), None);
        assert_eq!(accept_period(1).map(NonZeroU32::get), Some(1));
        assert_eq!(accept_period(999_999).map(NonZeroU32::get), Some(999_999));
        assert_eq!(accept_period(PERIOD_LIMIT_TICKS), None);
        assert_eq!(accept_period(u32::MAX), None);
    }

    #[test]
    fn test_initial_state() {
        let meter = Meter::default();
        assert_eq!(meter.voltages(), [0; CHANNEL_COUNT]);
        assert_eq!(meter.readings(), [ChannelReading::INITIAL; CHANNEL_COUNT]);
        for (index, state) in meter.channels.iter().enumerate() {
            assert_eq!(state.id().index(), index);
        }
    }

    #[test]
    fn test_valid_period_updates_voltage() {
        let meter = Meter::default();
        meter.on_edge(ch(0), Ticks::new(0));
        let outcome = meter.on_edge(ch(0), Ticks::new(1000));

        assert_eq!(
            outcome,
            EdgeOutcome::Accepted {
                period: 1000,
                voltage: DEFAULT_COEFFICIENT / 1000
            }
        );
        assert_eq!(meter.reading(ch(0)).voltage, 7692);
        assert_eq!(meter.reading(ch(0)).last_edge, Ticks::new(1000));
    }

    #[test]
    fn test_zero_period_is_rejected() {
        let meter = Meter::default();
        meter.on_edge(ch(2), Ticks::new(0));
        let outcome = meter.on_edge(ch(2), Ticks::new(0));

        assert_eq!(outcome, EdgeOutcome::Rejected { period: 0 });
        assert_eq!(meter.reading(ch(2)).voltage, 0);
    }

    #[test]
    fn test_long_period_keeps_voltage_but_moves_timestamp() {
        let meter = Meter::default();
        meter.on_edge(ch(1), Ticks::new(500));
        meter.on_edge(ch(1), Ticks::new(1500));
        assert_eq!(meter.reading(ch(1)).voltage, 7692);

        let outcome = meter.on_edge(ch(1), Ticks::new(2_001_500));
        assert!(!outcome.is_accepted());
        assert_eq!(outcome.period(), 2_000_000);

        let reading = meter.reading(ch(1));
        assert_eq!(reading.voltage, 7692);
        assert_eq!(reading.last_edge, Ticks::new(2_001_500));

        // The next edge measures from the rejected one
        meter.on_edge(ch(1), Ticks::new(2_003_500));
        assert_eq!(meter.reading(ch(1)).voltage, DEFAULT_COEFFICIENT / 2000);
    }

    #[test]
    fn test_period_across_counter_wrap() {
        let meter = Meter::default();
        meter.on_edge(ch(3), Ticks::new(u32::MAX - 499));
        let outcome = meter.on_edge(ch(3), Ticks::new(500));
        assert_eq!(outcome.period(), 1000);
        assert_eq!(meter.reading(ch(3)).voltage, 7692);
    }

    #[test]
    fn test_channels_are_independent() {
        let meter = Meter::new(CalibrationTable::new([1000, 2000, 3000, 4000, 5000]));
        for id in ChannelId::all() {
            meter.on_edge(id, Ticks::new(100));
            meter.on_edge(id, Ticks::new(110));
        }
        assert_eq!(meter.voltages(), [100, 200, 300, 400, 500]);
    }

    #[test]
    fn test_on_edge_at_reads_timer() {
        let meter = Meter::default();
        meter.on_edge_at(ch(4), &|| 10_000u32);
        assert_eq!(meter.reading(ch(4)).last_edge, Ticks::new(10_000));
    }
}
