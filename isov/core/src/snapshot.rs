//! Textual snapshots and partial-read sessions
//!
//! A snapshot is one record of the form
//! `"V1=<v0> V2=<v1> V3=<v2> V4=<v3> V5=<v4> \n"` followed by a NUL byte.
//! A [`ReadSession`] captures a snapshot on its first read and keeps serving
//! that same record to subsequent partial reads until a read lands at or past
//! its end; the next read after that captures a fresh one.

use core::fmt::Write;

use heapless::{String, Vec};

use crate::channel::{ChannelId, CHANNEL_COUNT};
use crate::engine::Meter;
use crate::{IsovError, IsovResult};

/// Room for five `i32::MIN` values plus labels, separators and terminator
pub const SNAPSHOT_CAPACITY: usize = 96;

/// Anything that can supply the current voltages
pub trait VoltageSource {
    /// Voltage of every channel, in channel order
    fn voltages(&self) -> [i32; CHANNEL_COUNT];
}

impl VoltageSource for Meter {
    fn voltages(&self) -> [i32; CHANNEL_COUNT] {
        Meter::voltages(self)
    }
}

impl VoltageSource for [i32; CHANNEL_COUNT] {
    fn voltages(&self) -> [i32; CHANNEL_COUNT] {
        *self
    }
}

/// One generated record, NUL terminator included
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    record: Vec<u8, SNAPSHOT_CAPACITY>,
}

impl Snapshot {
    /// Capture the current voltages of `source`
    pub fn capture<S: VoltageSource + ?Sized>(source: &S) -> IsovResult<Self> {
        Self::format(&source.voltages())
    }

    /// Format a record from explicit voltages
    pub fn format(voltages: &[i32; CHANNEL_COUNT]) -> IsovResult<Self> {
        let mut text: String<SNAPSHOT_CAPACITY> = String::new();
        for (id, voltage) in ChannelId::all().zip(voltages.iter()) {
            write!(text, "V{}={} ", id.number(), voltage).map_err(|_| IsovError::NoData)?;
        }
        text.push('\n').map_err(|_| IsovError::NoData)?;
        text.push('\0').map_err(|_| IsovError::NoData)?;

        let record = text.into_bytes();
        if record.is_empty() {
            return Err(IsovError::NoData);
        }
        Ok(Self { record })
    }

    /// Whole record, terminator included
    pub fn as_bytes(&self) -> &[u8] {
        &self.record
    }

    /// Record text without the NUL terminator
    pub fn as_str(&self) -> &str {
        let bytes = self.record.as_slice();
        let text = bytes.strip_suffix(&[0u8]).unwrap_or(bytes);
        core::str::from_utf8(text).unwrap_or_default()
    }

    /// Record length in bytes, terminator included
    pub fn len(&self) -> usize {
        self.record.len()
    }

    /// Check if the record holds no bytes
    pub fn is_empty(&self) -> bool {
        self.record.is_empty()
    }

    /// Copy bytes starting at `offset` into `buf`.
    ///
    /// Returns the number of bytes copied; zero once `offset` reaches the end.
    pub fn read_at(&self, offset: usize, buf: &mut [u8]) -> usize {
        let Some(remaining) = self.record.get(offset..) else {
            return 0;
        };
        let len = remaining.len().min(buf.len());
        buf[..len].copy_from_slice(&remaining[..len]);
        len
    }
}

/// Per-reader state: the snapshot being served and the read cursor.
///
/// Each reader owns its session, so concurrent readers never share a buffer.
#[derive(Debug, Default)]
pub struct ReadSession {
    current: Option<Snapshot>,
    cursor: usize,
}

impl ReadSession {
    /// Create a session with no snapshot captured yet
    pub const fn new() -> Self {
        Self {
            current: None,
            cursor: 0,
        }
    }

    /// Read the next chunk of the current record.
    ///
    /// Returns `Ok(0)` once the record has been fully consumed; the following
    /// call starts a new record.
    pub fn read<S: VoltageSource + ?Sized>(&mut self, source: &S, buf: &mut [u8]) -> IsovResult<usize> {
        let copied = self.read_at(source, self.cursor, buf)?;
        self.cursor = if self.current.is_some() {
            self.cursor + copied
        } else {
            0
        };
        Ok(copied)
    }

    /// Read from an explicit `offset` into the current record.
    ///
    /// Captures a snapshot if none is pending. A read at or past the end of the
    /// record returns `Ok(0)` and retires the record.
    pub fn read_at<S: VoltageSource + ?Sized>(
        &mut self,
        source: &S,
        offset: usize,
        buf: &mut [u8],
    ) -> IsovResult<usize> {
        if self.current.is_none() {
            self.current = Some(Snapshot::capture(source)?);
        }
        let Some(snapshot) = self.current.as_ref() else {
            return Err(IsovError::NoData);
        };

        let copied = snapshot.read_at(offset, buf);
        if offset >= snapshot.len() {
            self.current = None;
        }
        Ok(copied)
    }

    /// Snapshot currently being served, if any
    pub fn pending(&self) -> Option<&Snapshot> {
        self.current.as_ref()
    }

    /// Current cursor into the pending record
    pub fn position(&self) -> usize {
        self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_format() {
        let snapshot = Snapshot::format(&[7692, 0, -3, 12, 5]).unwrap();
        assert_eq!(snapshot.as_bytes(), b"V1=7692 V2=0 V3=-3 V4=12 V5=5 \n\0");
        assert_eq!(snapshot.as_str(), "V1=7692 V2=0 V3=-3 V4=12 V5=5 \n");
    }

    #[test]
    fn test_extreme_values_fit() {
        let snapshot = Snapshot::format(&[i32::MIN; CHANNEL_COUNT]).unwrap();
        assert_eq!(snapshot.len(), 5 * "V1=-2147483648 ".len() + 2);
    }

    #[test]
    fn test_read_at_past_end() {
        let snapshot = Snapshot::format(&[0; CHANNEL_COUNT]).unwrap();
        let mut buf = [0u8; 8];
        assert_eq!(snapshot.read_at(snapshot.len(), &mut buf), 0);
        assert_eq!(snapshot.read_at(snapshot.len() + 10, &mut buf), 0);
    }

    #[test]
    fn test_session_serves_one_record_until_consumed() {
        let mut voltages = [1, 2, 3, 4, 5];
        let mut session = ReadSession::new();
        let mut buf = [0u8; 4];

        assert_eq!(session.read(&voltages, &mut buf).unwrap(), 4);
        assert_eq!(&buf, b"V1=1");

        // Later changes do not leak into the record being served
        voltages = [9, 9, 9, 9, 9];
        let mut rest = [0u8; 64];
        let n = session.read(&voltages, &mut rest).unwrap();
        assert_eq!(&rest[..n], b" V2=2 V3=3 V4=4 V5=5 \n\0");

        assert_eq!(session.read(&voltages, &mut rest).unwrap(), 0);
        assert!(session.pending().is_none());
        assert_eq!(session.position(), 0);

        let n = session.read(&voltages, &mut rest).unwrap();
        assert_eq!(&rest[..n], b"V1=9 V2=9 V3=9 V4=9 V5=9 \n\0");
    }

    #[test]
    fn test_empty_buffer_does_not_end_record() {
        let voltages = [1, 2, 3, 4, 5];
        let mut session = ReadSession::new();
        assert_eq!(session.read(&voltages, &mut []).unwrap(), 0);
        assert!(session.pending().is_some());
        assert_eq!(session.position(), 0);
    }
}
