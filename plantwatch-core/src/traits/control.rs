//! Rectifier module control

/// Errors from module control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlError {
    /// No module with this index
    UnknownModule,
    /// Requested power level outside 0-100 %
    InvalidLevel,
}

/// Trait for the actuators behind the rectifier modules
///
/// Module indices are 0-based.
pub trait ModuleControl {
    /// Enable or disable a module's output
    fn set_enabled(&mut self, module: u8, enabled: bool) -> Result<(), ControlError>;

    /// Limit a module to `percent` of its rated output
    fn reduce_power(&mut self, module: u8, percent: u8) -> Result<(), ControlError>;

    /// Turn a single module off
    fn shutdown_module(&mut self, module: u8) -> Result<(), ControlError>;

    /// Turn every module off
    ///
    /// Must not fail: this is the last line of protection.
    fn shutdown_all(&mut self);
}
