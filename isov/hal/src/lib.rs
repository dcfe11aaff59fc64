//! Hardware boundary of the ISOV meter
//!
//! This crate provides the vendor-agnostic traits the measurement core is
//! driven through: interrupt-capable input lines, the free-running counter,
//! line registration with rollback, and the read-only device the snapshots are
//! served from. Platform ports implement the traits; the core never touches
//! registers itself.

#![cfg_attr(not(feature = "std"), no_std)]

pub mod device;
pub mod error;
pub mod gpio;
pub mod interrupt;
pub mod timer;

// Re-export commonly used types
pub use device::MeterDevice;
pub use error::{HalError, HalResult};
pub use gpio::{Edge, InputLine, InterruptLine, Level, LineProvider};
pub use interrupt::{EdgeDispatcher, EdgeLines};
pub use timer::{CounterClock, FreeRunningCounter};
