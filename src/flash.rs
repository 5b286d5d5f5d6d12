//! Flash-backed record medium.
//!
//! The nRF52840 has no EEPROM, so the lap record's byte region is kept
//! in internal flash via `sequential-storage` (key-value map, handles
//! wear levelling and GC).
//!
//! Storage layout:
//!   - One map item under `KEY_LAP_RECORD` holding the raw record bytes.
//!   - Byte writes land in a RAM image; `commit` appends a new item only
//!     when at least one byte actually changed.
//!   - A missing item reads as erased (0xFF) bytes, which fails the
//!     sentinel check and triggers first-use initialisation.
//!   - A corrupted map (typically a store cut short by the power latch)
//!     is reported as [`Error::Corrupted`]; `erase` wipes the region so
//!     the next store lands. Other flash failures stay `Error::Storage`.

use defmt::{debug, error, info, warn};
use embassy_futures::block_on;
use embedded_storage_async::nor_flash::NorFlash;
use lapcount::config::{STORAGE_FLASH_PAGE_COUNT, STORAGE_FLASH_PAGE_START};
use lapcount::storage::{RecordMedium, RECORD_LEN};
use lapcount::{Error, Result};
use sequential_storage::cache::NoCache;
use sequential_storage::{erase_all, map};

/// Flash page size for nRF52840 (4 KB).
const FLASH_PAGE_SIZE: u32 = 4096;

/// Start address of our storage region.
const STORAGE_START: u32 = STORAGE_FLASH_PAGE_START * FLASH_PAGE_SIZE;

/// End address (exclusive) of our storage region.
const STORAGE_END: u32 = (STORAGE_FLASH_PAGE_START + STORAGE_FLASH_PAGE_COUNT) * FLASH_PAGE_SIZE;

/// Key for the lap record in the map storage.
const KEY_LAP_RECORD: u8 = 0x01;

/// Scratch space for sequential-storage (item header + key + record, word aligned).
const DATA_BUFFER_LEN: usize = 64;

/// RAM image of the record region, loaded lazily from flash.
pub struct FlashMedium<F> {
    flash: F,
    image: [u8; RECORD_LEN],
    loaded: bool,
    dirty: bool,
}

impl<F: NorFlash> FlashMedium<F> {
    pub fn new(flash: F) -> Self {
        Self {
            flash,
            image: [0xFF; RECORD_LEN],
            loaded: false,
            dirty: false,
        }
    }

    fn ensure_loaded(&mut self) -> Result<()> {
        if self.loaded {
            return Ok(());
        }

        let mut buf = [0u8; DATA_BUFFER_LEN];
        let fetched = block_on(map::fetch_item::<u8, &[u8], _>(
            &mut self.flash,
            STORAGE_START..STORAGE_END,
            &mut NoCache::new(),
            &mut buf,
            &KEY_LAP_RECORD,
        ));

        match fetched {
            Ok(Some(data)) if data.len() == RECORD_LEN => {
                self.image.copy_from_slice(data);
                debug!("Flash: record image {=[u8]:x}", &self.image[..]);
            }
            Ok(Some(data)) => {
                warn!("Flash: stored item has {} bytes, expected {}", data.len(), RECORD_LEN);
                self.image = [0xFF; RECORD_LEN];
            }
            Ok(None) => {
                info!("Flash: no record stored");
                self.image = [0xFF; RECORD_LEN];
            }
            Err(e) => {
                error!("Flash read error: {:?}", defmt::Debug2Format(&e));
                return Err(classify(&e));
            }
        }

        self.loaded = true;
        self.dirty = false;
        Ok(())
    }
}

impl<F: NorFlash> RecordMedium for FlashMedium<F> {
    fn capacity(&self) -> usize {
        RECORD_LEN
    }

    fn read(&mut self, offset: usize, buf: &mut [u8]) -> Result<()> {
        self.ensure_loaded()?;
        let end = offset.checked_add(buf.len()).ok_or(Error::OutOfBounds)?;
        let src = self.image.get(offset..end).ok_or(Error::OutOfBounds)?;
        buf.copy_from_slice(src);
        Ok(())
    }

    fn write_byte(&mut self, offset: usize, byte: u8) -> Result<()> {
        self.ensure_loaded()?;
        let slot = self.image.get_mut(offset).ok_or(Error::OutOfBounds)?;
        if *slot != byte {
            *slot = byte;
            self.dirty = true;
        }
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        if !self.dirty {
            debug!("Flash: no changes to commit");
            return Ok(());
        }

        let mut buf = [0u8; DATA_BUFFER_LEN];
        let item: &[u8] = &self.image;

        match block_on(map::store_item::<u8, &[u8], _>(
            &mut self.flash,
            STORAGE_START..STORAGE_END,
            &mut NoCache::new(),
            &mut buf,
            &KEY_LAP_RECORD,
            &item,
        )) {
            Ok(()) => {
                info!("Flash: record committed");
                self.dirty = false;
                Ok(())
            }
            Err(e) => {
                error!("Flash write error: {:?}", defmt::Debug2Format(&e));
                Err(classify(&e))
            }
        }
    }

    fn erase(&mut self) -> Result<()> {
        if let Err(e) = block_on(erase_all(&mut self.flash, STORAGE_START..STORAGE_END)) {
            error!("Flash erase error: {:?}", defmt::Debug2Format(&e));
            return Err(Error::Storage);
        }
        warn!("Flash: storage region erased");
        self.image = [0xFF; RECORD_LEN];
        self.loaded = true;
        self.dirty = false;
        Ok(())
    }
}

/// Map a sequential-storage failure onto the record error.
fn classify<E>(e: &sequential_storage::Error<E>) -> Error {
    match e {
        sequential_storage::Error::Corrupted { .. } => Error::Corrupted,
        _ => Error::Storage,
    }
}
