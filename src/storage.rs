//! Persistent lap record.
//!
//! Storage layout (4 bytes at [`RECORD_OFFSET`], little-endian):
//! ```text
//! Byte 0-1: sentinel (RECORD_SENTINEL when initialised)
//! Byte 2-3: lap count
//! ```
//!
//! The medium is anything byte-addressable behind [`RecordMedium`]:
//! EEPROM, a RAM buffer in tests, or the flash-backed image used by the
//! nRF52840 binary. Only bytes that differ from what is stored get written.

use crate::config::{RECORD_OFFSET, RECORD_SENTINEL};
use crate::error::{Error, Result};

/// Serialized record size in bytes.
pub const RECORD_LEN: usize = 4;

/// Byte-addressable persistent region.
pub trait RecordMedium {
    /// Size of the region in bytes.
    fn capacity(&self) -> usize;

    /// Fill `buf` from `offset`.
    fn read(&mut self, offset: usize, buf: &mut [u8]) -> Result<()>;

    /// Write one byte at `offset`.
    fn write_byte(&mut self, offset: usize, byte: u8) -> Result<()>;

    /// Make preceding writes durable. Media that write through do nothing.
    fn commit(&mut self) -> Result<()> {
        Ok(())
    }

    /// Return the whole region to the erased state (all 0xFF).
    fn erase(&mut self) -> Result<()> {
        for offset in 0..self.capacity() {
            self.write_byte(offset, 0xFF)?;
        }
        self.commit()
    }
}

impl<T: RecordMedium + ?Sized> RecordMedium for &mut T {
    fn capacity(&self) -> usize {
        (**self).capacity()
    }

    fn read(&mut self, offset: usize, buf: &mut [u8]) -> Result<()> {
        (**self).read(offset, buf)
    }

    fn write_byte(&mut self, offset: usize, byte: u8) -> Result<()> {
        (**self).write_byte(offset, byte)
    }

    fn commit(&mut self) -> Result<()> {
        (**self).commit()
    }

    fn erase(&mut self) -> Result<()> {
        (**self).erase()
    }
}

/// The one persisted value: a tagged lap count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LapRecord {
    pub sentinel: u16,
    pub count: u16,
}

impl LapRecord {
    /// An initialised record with a zero count.
    pub const fn fresh() -> Self {
        Self {
            sentinel: RECORD_SENTINEL,
            count: 0,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.sentinel == RECORD_SENTINEL
    }

    /// Count one lap. Saturates instead of wrapping back to zero.
    pub fn increment(&mut self) {
        self.count = self.count.saturating_add(1);
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }

    pub fn to_bytes(&self) -> [u8; RECORD_LEN] {
        let s = self.sentinel.to_le_bytes();
        let c = self.count.to_le_bytes();
        [s[0], s[1], c[0], c[1]]
    }

    /// Decode without validating; see [`LapRecord::is_valid`].
    pub fn from_bytes(bytes: &[u8; RECORD_LEN]) -> Self {
        Self {
            sentinel: u16::from_le_bytes([bytes[0], bytes[1]]),
            count: u16::from_le_bytes([bytes[2], bytes[3]]),
        }
    }
}

/// Loads and saves the [`LapRecord`] on a medium.
pub struct LapStore<M> {
    medium: M,
}

impl<M: RecordMedium> LapStore<M> {
    pub fn new(medium: M) -> Self {
        Self { medium }
    }

    /// Read the stored record, reinitialising it when the sentinel is wrong.
    ///
    /// Reinitialisation happens in memory only; it reaches the medium with
    /// the next [`LapStore::save`]. A corrupted medium is erased first so
    /// that save can land.
    pub fn load(&mut self) -> Result<LapRecord> {
        let raw = match self.read_raw() {
            Err(Error::Corrupted) => {
                warn!("Record: medium corrupted - erasing and reinitialising");
                self.medium.erase()?;
                return Ok(LapRecord::fresh());
            }
            raw => raw?,
        };
        let record = LapRecord::from_bytes(&raw);
        if record.is_valid() {
            info!("Record: loaded count={}", record.count);
            Ok(record)
        } else {
            warn!(
                "Record: sentinel {=u16:#x} invalid - reinitialising",
                record.sentinel
            );
            Ok(LapRecord::fresh())
        }
    }

    /// Write back only the bytes that differ from the stored ones.
    ///
    /// Returns the number of bytes written; zero means the medium already
    /// held this record and nothing was committed.
    pub fn save(&mut self, record: &LapRecord) -> Result<usize> {
        let stored = self.read_raw()?;
        let wanted = record.to_bytes();

        let mut written = 0;
        for (i, (old, new)) in stored.iter().zip(wanted.iter()).enumerate() {
            if old != new {
                self.medium.write_byte(RECORD_OFFSET + i, *new)?;
                written += 1;
            }
        }

        if written == 0 {
            debug!("Record: unchanged, nothing to save");
            return Ok(0);
        }

        self.medium.commit()?;
        info!("Record: saved count={} ({} bytes)", record.count, written);
        Ok(written)
    }

    pub fn medium(&self) -> &M {
        &self.medium
    }

    pub fn medium_mut(&mut self) -> &mut M {
        &mut self.medium
    }

    fn read_raw(&mut self) -> Result<[u8; RECORD_LEN]> {
        if self.medium.capacity() < RECORD_OFFSET + RECORD_LEN {
            return Err(Error::OutOfBounds);
        }
        let mut buf = [0u8; RECORD_LEN];
        self.medium.read(RECORD_OFFSET, &mut buf)?;
        Ok(buf)
    }
}
