//! Unified error type for lapcount.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` for efficient on-target logging.

/// Top-level error type used across the firmware.
///
/// Only the persistent medium can fail in a way the session cares about;
/// pin and display I/O is treated as infallible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // Storage
    /// Flash/EEPROM read, write or commit failed.
    Storage,

    /// The medium is readable but its contents cannot be decoded, e.g.
    /// after power was cut mid-write. Recovered by erasing the medium.
    Corrupted,

    /// The record does not fit inside the persistent region.
    OutOfBounds,
}

pub type Result<T> = core::result::Result<T, Error>;
