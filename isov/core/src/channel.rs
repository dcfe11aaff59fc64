//! Channel identity and guarded per-channel state

use core::cell::Cell;
use core::fmt;

use critical_section::Mutex;

use crate::time::Ticks;
use crate::{IsovError, IsovResult};

/// Number of measured input lines
pub const CHANNEL_COUNT: usize = 5;

/// Stable index of a measured input line (`0..CHANNEL_COUNT`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChannelId(u8);

impl ChannelId {
    pub const FIRST: Self = Self(0);
    pub const SECOND: Self = Self(1);
    pub const THIRD: Self = Self(2);
    pub const FOURTH: Self = Self(3);
    pub const FIFTH: Self = Self(4);

    /// Validate a raw channel index
    pub const fn new(index: u8) -> IsovResult<Self> {
        if (index as usize) < CHANNEL_COUNT {
            Ok(Self(index))
        } else {
            Err(IsovError::InvalidChannel(index))
        }
    }

    /// Zero-based index, usable for table lookups
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// One-based number used in snapshot labels (`V1`..`V5`)
    pub const fn number(self) -> u8 {
        self.0 + 1
    }

    /// All channels in index order
    pub fn all() -> impl Iterator<Item = ChannelId> + Clone {
        (0..CHANNEL_COUNT as u8).map(ChannelId)
    }
}

impl TryFrom<usize> for ChannelId {
    type Error = IsovError;

    fn try_from(index: usize) -> IsovResult<Self> {
        let raw = u8::try_from(index).map_err(|_| IsovError::InvalidChannel(u8::MAX))?;
        Self::new(raw)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "V{}", self.number())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ChannelId {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "V{}", self.number());
    }
}

/// Consistent view of one channel: the last accepted edge and the last voltage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelReading {
    /// Timestamp of the most recent falling edge
    pub last_edge: Ticks,
    /// Most recent valid voltage, in calibration units
    pub voltage: i32,
}

impl ChannelReading {
    /// State at system start
    pub const INITIAL: Self = Self {
        last_edge: Ticks::ZERO,
        voltage: 0,
    };
}

#[cfg(feature = "defmt")]
impl defmt::Format for ChannelReading {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{{edge: {}, voltage: {}}}", self.last_edge, self.voltage);
    }
}

/// Per-channel state shared between the edge path and snapshot readers.
///
/// Both fields live in one cell behind a critical section, so a reader sees
/// either the whole previous pair or the whole updated pair. Only the engine
/// writes it.
pub(crate) struct ChannelState {
    id: ChannelId,
    reading: Mutex<Cell<ChannelReading>>,
}

impl ChannelState {
    /// Create a channel in its initial state
    pub(crate) const fn new(id: ChannelId) -> Self {
        Self {
            id,
            reading: Mutex::new(Cell::new(ChannelReading::INITIAL)),
        }
    }

    /// Channel identity
    pub(crate) const fn id(&self) -> ChannelId {
        self.id
    }

    /// Copy the current pair out
    pub(crate) fn load(&self) -> ChannelReading {
        critical_section::with(|cs| self.reading.borrow(cs).get())
    }

    /// Apply `f` to the pair inside one critical section.
    ///
    /// `f` runs with interrupts masked and must be short.
    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut ChannelReading) -> R) -> R {
        critical_section::with(|cs| {
            let cell = self.reading.borrow(cs);
            let mut reading = cell.get();
            let result = f(&mut reading);
            cell.set(reading);
            result
        })
    }
}

impl fmt::Debug for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelState")
            .field("id", &self.id)
            .field("reading", &self.load())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_id_bounds() {
        assert!(ChannelId::new(0).is_ok());
        assert!(ChannelId::new(4).is_ok());
        assert_eq!(ChannelId::new(5), Err(IsovError::InvalidChannel(5)));
        assert!(ChannelId::try_from(300usize).is_err());
    }

    #[test]
    fn test_channel_id_numbering() {
        let ids: heapless::Vec<u8, CHANNEL_COUNT> = ChannelId::all().map(ChannelId::number).collect();
        assert_eq!(ids.as_slice(), &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_update_is_visible_to_load() {
        let state = ChannelState::new(ChannelId(2));
        assert_eq!(state.load(), ChannelReading::INITIAL);

        let returned = state.update(|reading| {
            reading.last_edge = Ticks::new(10);
            reading.voltage = 7;
            reading.voltage * 2
        });

        assert_eq!(returned, 14);
        assert_eq!(
            state.load(),
            ChannelReading {
                last_edge: Ticks::new(10),
                voltage: 7
            }
        );
        assert_eq!(state.id(), ChannelId::THIRD);
    }
}
