//! Flash-backed settings store
//!
//! The settings image lives alone in sector 11 of the STM32F407 flash
//! (0x080E_0000, 128 KiB), behind a 4-byte little-endian length. An erased
//! sector reads as all 0xFF, which is reported as an empty store.

use defmt::*;
use embassy_stm32::flash::{Blocking, Flash, WRITE_SIZE};
use plantwatch_core::persist::CONFIG_IMAGE_SIZE;
use plantwatch_core::traits::{ConfigStore, StoreError};

/// Sector 11 offset from the start of flash
pub const CONFIG_SECTOR_OFFSET: u32 = 0xE_0000;

/// Sector 11 size
pub const CONFIG_SECTOR_SIZE: u32 = 128 * 1024;

const HEADER_SIZE: usize = 4;

/// Header plus image, rounded up to whole write units
const STAGING_SIZE: usize = (HEADER_SIZE + CONFIG_IMAGE_SIZE).div_ceil(WRITE_SIZE) * WRITE_SIZE;

/// Settings store in the last flash sector
pub struct FlashConfigStore<'d> {
    flash: Flash<'d, Blocking>,
}

impl<'d> FlashConfigStore<'d> {
    pub fn new(flash: Flash<'d, Blocking>) -> Self {
        Self { flash }
    }
}

impl ConfigStore for FlashConfigStore<'_> {
    fn load(&mut self, buffer: &mut [u8]) -> Result<usize, StoreError> {
        let mut header = [0u8; HEADER_SIZE];
        self.flash
            .blocking_read(CONFIG_SECTOR_OFFSET, &mut header)
            .map_err(|_| StoreError::Io)?;

        let len = u32::from_le_bytes(header);
        if len == u32::MAX || len == 0 {
            return Err(StoreError::Empty);
        }
        let len = len as usize;
        if len > CONFIG_IMAGE_SIZE || len > buffer.len() {
            return Err(StoreError::BufferTooSmall);
        }

        self.flash
            .blocking_read(CONFIG_SECTOR_OFFSET + HEADER_SIZE as u32, &mut buffer[..len])
            .map_err(|_| StoreError::Io)?;
        Ok(len)
    }

    fn save(&mut self, data: &[u8]) -> Result<(), StoreError> {
        if data.len() > CONFIG_IMAGE_SIZE {
            return Err(StoreError::BufferTooSmall);
        }

        let mut staging = [0xFFu8; STAGING_SIZE];
        staging[..HEADER_SIZE].copy_from_slice(&(data.len() as u32).to_le_bytes());
        staging[HEADER_SIZE..HEADER_SIZE + data.len()].copy_from_slice(data);
        let used = (HEADER_SIZE + data.len()).div_ceil(WRITE_SIZE) * WRITE_SIZE;

        self.flash
            .blocking_erase(CONFIG_SECTOR_OFFSET, CONFIG_SECTOR_OFFSET + CONFIG_SECTOR_SIZE)
            .map_err(|_| StoreError::Io)?;
        self.flash
            .blocking_write(CONFIG_SECTOR_OFFSET, &staging[..used])
            .map_err(|_| StoreError::Io)?;

        debug!("settings image written ({} bytes)", data.len());
        Ok(())
    }
}
