//! Settings persistence in the last flash sector.
//!
//! One 4-byte record at the start of the final 4 KiB sector: two magic
//! bytes, the packed settings byte, and a pad. The magic distinguishes a
//! written record from erased flash, so first boot falls back to defaults
//! instead of decoding 0xFF.
//!
//! Writes are erase-then-program of the whole sector. They only ever happen
//! from the scan loop, never from tick context.

use defmt::warn;
use embassy_rp::flash::{Blocking, Flash, ERASE_SIZE};
use embassy_rp::peripherals::FLASH;
use embassy_rp::Peri;

/// Pico 2 on-board flash.
pub const FLASH_SIZE: usize = 4 * 1024 * 1024;

const RECORD_OFFSET: u32 = (FLASH_SIZE - ERASE_SIZE) as u32;
const MAGIC: [u8; 2] = [0x4B, 0x4C];

pub struct SettingsStore {
    flash: Flash<'static, FLASH, Blocking, FLASH_SIZE>,
}

impl SettingsStore {
    pub fn new(flash: Peri<'static, FLASH>) -> Self {
        SettingsStore {
            flash: Flash::new_blocking(flash),
        }
    }

    /// Read the persisted settings byte, or `None` when the sector has never
    /// been written (or the record is unrecognizable).
    pub fn load(&mut self) -> Option<u8> {
        let mut record = [0u8; 4];
        if let Err(e) = self.flash.blocking_read(RECORD_OFFSET, &mut record) {
            warn!("settings read failed: {}", e);
            return None;
        }
        if record[..2] == MAGIC {
            Some(record[2])
        } else {
            None
        }
    }

    /// Persist the packed settings byte. The sector erase blocks the
    /// executor for several milliseconds, so this must stay in loop
    /// context and off any per-pass path. Failures are logged and
    /// swallowed: a module that cannot remember its settings still has to
    /// keep clocking.
    pub fn save(&mut self, settings: u8) {
        let record = [MAGIC[0], MAGIC[1], settings, 0x00];
        let result = self
            .flash
            .blocking_erase(RECORD_OFFSET, RECORD_OFFSET + ERASE_SIZE as u32)
            .and_then(|()| self.flash.blocking_write(RECORD_OFFSET, &record));
        if let Err(e) = result {
            warn!("settings write failed: {}", e);
        }
    }
}
