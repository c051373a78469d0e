//! Non-volatile configuration storage

/// Errors from a configuration store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    /// Nothing has been saved yet
    Empty,
    /// Stored image does not fit the caller's buffer
    BufferTooSmall,
    /// Underlying flash or medium failed
    Io,
}

/// Trait for a single-slot byte store holding the settings image
pub trait ConfigStore {
    /// Read the stored image into `buffer`, returning its length
    fn load(&mut self, buffer: &mut [u8]) -> Result<usize, StoreError>;

    /// Replace the stored image
    fn save(&mut self, data: &[u8]) -> Result<(), StoreError>;
}
