//! Read-only measurement device
//!
//! File-operation surface of the meter: `open` hands out an independent
//! [`ReadSession`], `read` serves the session's snapshot in arbitrary chunks and
//! `write` is always refused.

use core::ops::Deref;

use heapless::String;
use isov_core::config::NAME_CAPACITY;
use isov_core::{IsovError, IsovResult, Meter, MeterConfig, ReadSession};
use log::{debug, error};

/// Device publishing the meter's snapshots
pub struct MeterDevice<M> {
    meter: M,
    name: String<NAME_CAPACITY>,
}

impl<M: Deref<Target = Meter>> MeterDevice<M> {
    /// Create the device named after `config.device_name`
    pub fn new(meter: M, config: &MeterConfig) -> Self {
        Self {
            meter,
            name: config.device_name.clone(),
        }
    }

    /// Device name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get reference to the meter
    pub fn meter(&self) -> &Meter {
        &self.meter
    }

    /// Start a new read session
    pub fn open(&self) -> ReadSession {
        debug!("{}: open", self.name);
        ReadSession::new()
    }

    /// Read the next chunk of the session's record; `Ok(0)` marks its end
    pub fn read(&self, session: &mut ReadSession, buf: &mut [u8]) -> IsovResult<usize> {
        session.read(self.meter(), buf).map_err(|err| self.read_failed(err))
    }

    /// Read from an explicit offset into the session's record
    pub fn read_at(&self, session: &mut ReadSession, offset: usize, buf: &mut [u8]) -> IsovResult<usize> {
        session
            .read_at(self.meter(), offset, buf)
            .map_err(|err| self.read_failed(err))
    }

    /// Writes are not accepted
    pub fn write(&self, _session: &mut ReadSession, data: &[u8]) -> IsovResult<usize> {
        debug!("{}: rejected write of {} bytes", self.name, data.len());
        Err(IsovError::InvalidWrite)
    }

    /// End a read session
    pub fn release(&self, session: ReadSession) {
        debug!("{}: release at {}", self.name, session.position());
    }

    fn read_failed(&self, err: IsovError) -> IsovError {
        error!("{}: snapshot not written: {}", self.name, err);
        err
    }
}
