#![no_std]
#![forbid(unsafe_code)]

//! # ISOV Core
//!
//! Measurement core of the five channel isolated voltage meter. Each input is a
//! voltage-to-frequency converter output; the core times the period between two
//! falling edges on a channel and converts it into a voltage with a static
//! per-channel calibration coefficient.
//!
//! The crate is split the same way the data flows:
//! - [`time`]        - tick type and the monotonic timer contract.
//! - [`calibration`] - static coefficient table.
//! - [`channel`]     - channel identity and the guarded per-channel state.
//! - [`engine`]      - the period-to-voltage engine driven from the edge path.
//! - [`snapshot`]    - textual snapshots and partial-read sessions.
//! - [`config`]      - startup configuration and its builder.
//!
//! Nothing on the edge path allocates, loops over channels or blocks: an edge
//! costs one short critical section on the affected channel.

#[cfg(feature = "std")]
extern crate std;

use core::fmt;

pub mod calibration;
pub mod channel;
pub mod config;
pub mod engine;
pub mod snapshot;
pub mod time;

pub use calibration::{CalibrationTable, DEFAULT_COEFFICIENT};
pub use channel::{ChannelId, ChannelReading, CHANNEL_COUNT};
pub use config::{LineConfig, MeterConfig, MeterConfigBuilder, TimerConfig};
pub use engine::{accept_period, EdgeOutcome, Meter, PERIOD_LIMIT_TICKS};
pub use snapshot::{ReadSession, Snapshot, VoltageSource, SNAPSHOT_CAPACITY};
pub use time::{TickSource, Ticks, TICKS_PER_SEC};

/// Result type used throughout the meter
pub type IsovResult<T> = Result<T, IsovError>;

/// Error conditions reported by the measurement core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsovError {
    /// Data was written into the read-only measurement interface
    InvalidWrite,
    /// Snapshot formatting produced no usable bytes
    NoData,
    /// Channel index outside `0..CHANNEL_COUNT`
    InvalidChannel(u8),
    /// Startup configuration rejected
    InvalidConfig,
}

impl fmt::Display for IsovError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IsovError::InvalidWrite => write!(f, "Measurement interface is read-only"),
            IsovError::NoData => write!(f, "No snapshot data available"),
            IsovError::InvalidChannel(index) => write!(f, "Invalid channel index {}", index),
            IsovError::InvalidConfig => write!(f, "Invalid meter configuration"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for IsovError {}

#[cfg(feature = "defmt")]
impl defmt::Format for IsovError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            IsovError::InvalidWrite => defmt::write!(fmt, "InvalidWrite"),
            IsovError::NoData => defmt::write!(fmt, "NoData"),
            IsovError::InvalidChannel(index) => defmt::write!(fmt, "InvalidChannel({})", index),
            IsovError::InvalidConfig => defmt::write!(fmt, "InvalidConfig"),
        }
    }
}
