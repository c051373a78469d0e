//! Persistent plant settings
//!
//! Alarm configuration overrides and safety limits, stored in flash as a
//! postcard-encoded [`ConfigImage`] with a magic number, a format version
//! and a CRC-32 over the settings.

use heapless::Vec;
use serde::{Deserialize, Serialize};

use crate::alarm::{AlarmError, AlarmOverride, AlarmRegistry, MAX_CONFIG_OVERRIDES};
use crate::safety::{SafetyLimits, SafetyMonitor};
use crate::traits::{ConfigStore, FrameSink, StoreError};

/// Magic number to identify a settings image ("PWCF")
pub const CONFIG_MAGIC: u32 = u32::from_le_bytes(*b"PWCF");

/// Current settings format version
pub const CONFIG_VERSION: u8 = 1;

/// Upper bound on an encoded image
pub const CONFIG_IMAGE_SIZE: usize = 512;

/// Errors from saving or loading settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PersistError {
    /// Settings did not fit the image buffer
    Encode,
    /// Stored bytes are not a settings image
    Decode,
    BadMagic,
    BadVersion,
    /// CRC does not match the stored settings
    BadCrc,
    /// Stored limits violate their invariants
    InvalidLimits,
    /// More overrides than the table holds
    Capacity,
    Store(StoreError),
}

impl From<StoreError> for PersistError {
    fn from(e: StoreError) -> Self {
        PersistError::Store(e)
    }
}

impl From<AlarmError> for PersistError {
    fn from(_: AlarmError) -> Self {
        PersistError::Capacity
    }
}

/// Everything an operator can change at runtime
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PlantSettings {
    /// Alarm ids whose settings differ from the built-in table
    pub alarms: Vec<AlarmOverride, MAX_CONFIG_OVERRIDES>,
    pub limits: SafetyLimits,
}

impl PlantSettings {
    /// Snapshot the live configuration
    pub fn capture<S: FrameSink>(registry: &AlarmRegistry<S>, monitor: &SafetyMonitor) -> Self {
        Self {
            alarms: registry.config().overrides().collect(),
            limits: *monitor.limits(),
        }
    }

    /// Replace the live configuration with these settings
    pub fn apply<S: FrameSink>(
        &self,
        registry: &mut AlarmRegistry<S>,
        monitor: &mut SafetyMonitor,
    ) -> Result<(), PersistError> {
        self.limits
            .validate()
            .map_err(|_| PersistError::InvalidLimits)?;

        let table = registry.config_mut();
        table.reset_to_defaults();
        for o in &self.alarms {
            table.set(o.id, o.config)?;
        }
        *monitor.limits_mut() = self.limits;
        Ok(())
    }
}

/// Settings image as stored in flash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigImage {
    /// Magic number for validation
    pub magic: u32,
    /// Data format version
    pub version: u8,
    pub settings: PlantSettings,
    /// CRC-32 over the postcard encoding of `settings`
    pub crc: u32,
}

impl ConfigImage {
    pub fn new(settings: PlantSettings) -> Result<Self, PersistError> {
        let crc = settings_crc(&settings)?;
        Ok(Self {
            magic: CONFIG_MAGIC,
            version: CONFIG_VERSION,
            settings,
            crc,
        })
    }

    /// Check magic, version and CRC
    pub fn verify(&self) -> Result<(), PersistError> {
        if self.magic != CONFIG_MAGIC {
            return Err(PersistError::BadMagic);
        }
        if self.version != CONFIG_VERSION {
            return Err(PersistError::BadVersion);
        }
        if self.crc != settings_crc(&self.settings)? {
            return Err(PersistError::BadCrc);
        }
        self.settings
            .limits
            .validate()
            .map_err(|_| PersistError::InvalidLimits)
    }
}

fn settings_crc(settings: &PlantSettings) -> Result<u32, PersistError> {
    let mut scratch = [0u8; CONFIG_IMAGE_SIZE];
    let bytes = postcard::to_slice(settings, &mut scratch).map_err(|_| PersistError::Encode)?;
    Ok(crc32(bytes))
}

/// Encode settings into `buffer`, returning the image length
pub fn encode_settings(settings: &PlantSettings, buffer: &mut [u8]) -> Result<usize, PersistError> {
    let image = ConfigImage::new(settings.clone())?;
    let used = postcard::to_slice(&image, buffer).map_err(|_| PersistError::Encode)?;
    Ok(used.len())
}

/// Decode and verify a stored image
pub fn decode_settings(bytes: &[u8]) -> Result<PlantSettings, PersistError> {
    let image: ConfigImage = postcard::from_bytes(bytes).map_err(|_| PersistError::Decode)?;
    image.verify()?;
    Ok(image.settings)
}

/// Write settings to the store
pub fn save_config<C: ConfigStore>(
    store: &mut C,
    settings: &PlantSettings,
) -> Result<(), PersistError> {
    let mut buffer = [0u8; CONFIG_IMAGE_SIZE];
    let len = encode_settings(settings, &mut buffer)?;
    store.save(&buffer[..len])?;
    info!("settings saved ({=usize} bytes)", len);
    Ok(())
}

/// Read and verify settings from the store
pub fn load_config<C: ConfigStore>(store: &mut C) -> Result<PlantSettings, PersistError> {
    let mut buffer = [0u8; CONFIG_IMAGE_SIZE];
    let len = store.load(&mut buffer)?;
    decode_settings(&buffer[..len])
}

/// CRC-32 (IEEE 802.3, reflected)
pub fn crc32(data: &[u8]) -> u32 {
    const POLY: u32 = 0xEDB88320;
    let mut crc: u32 = 0xFFFFFFFF;

    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ POLY;
            } else {
                crc >>= 1;
            }
        }
    }

    !crc
}
