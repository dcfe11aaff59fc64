//! `std::io` view of the measurement device
//!
//! A [`DeviceFile`] is one open of the device: it owns a read session, reads
//! until the end of one record, then reports end of file. Writes fail with
//! [`io::ErrorKind::InvalidInput`].

use std::io::{self, Read, Write};
use std::mem;
use std::ops::Deref;

use isov_core::{Meter, ReadSession};
use isov_hal::MeterDevice;

/// Open handle on a [`MeterDevice`]
pub struct DeviceFile<'a, M: Deref<Target = Meter>> {
    device: &'a MeterDevice<M>,
    session: ReadSession,
}

impl<'a, M: Deref<Target = Meter>> DeviceFile<'a, M> {
    /// Open `device`
    pub fn open(device: &'a MeterDevice<M>) -> Self {
        Self {
            session: device.open(),
            device,
        }
    }

    /// Read one full record and return its text without the NUL terminator
    pub fn read_record(&mut self) -> io::Result<String> {
        let mut bytes = Vec::new();
        self.read_to_end(&mut bytes)?;
        if bytes.last() == Some(&0) {
            bytes.pop();
        }
        String::from_utf8(bytes).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
    }
}

impl<M: Deref<Target = Meter>> Read for DeviceFile<'_, M> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.device.read(&mut self.session, buf).map_err(io::Error::other)
    }
}

impl<M: Deref<Target = Meter>> Write for DeviceFile<'_, M> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.device
            .write(&mut self.session, buf)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<M: Deref<Target = Meter>> Drop for DeviceFile<'_, M> {
    fn drop(&mut self) {
        self.device.release(mem::take(&mut self.session));
    }
}
