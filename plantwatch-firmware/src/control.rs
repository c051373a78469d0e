//! Rectifier enable outputs
//!
//! Each rectifier module has one active-high enable line. Power reduction
//! has no analog output on this board, so the requested level is only
//! recorded and reported; a module at 0 % is switched off.

use defmt::*;
use embedded_hal::digital::OutputPin;
use plantwatch_core::traits::{ControlError, ModuleControl};

/// Bank of rectifier enable pins
pub struct RectifierBank<P: OutputPin, const N: usize> {
    pins: [P; N],
    enabled: [bool; N],
    power_pct: [u8; N],
}

impl<P: OutputPin, const N: usize> RectifierBank<P, N> {
    /// Take ownership of the pins; every module starts disabled
    pub fn new(mut pins: [P; N]) -> Self {
        for pin in pins.iter_mut() {
            pin.set_low().ok();
        }
        Self {
            pins,
            enabled: [false; N],
            power_pct: [100; N],
        }
    }

    pub fn is_enabled(&self, module: u8) -> bool {
        self.enabled.get(module as usize).copied().unwrap_or(false)
    }

    /// Output limit last requested for a module (%)
    pub fn power_pct(&self, module: u8) -> u8 {
        self.power_pct.get(module as usize).copied().unwrap_or(0)
    }

    fn drive(&mut self, index: usize, on: bool) {
        let result = if on {
            self.pins[index].set_high()
        } else {
            self.pins[index].set_low()
        };
        if result.is_err() {
            error!("rectifier {}: enable pin write failed", index);
        }
        self.enabled[index] = on;
    }

    fn index(module: u8) -> Result<usize, ControlError> {
        let index = module as usize;
        if index < N {
            Ok(index)
        } else {
            Err(ControlError::UnknownModule)
        }
    }
}

impl<P: OutputPin, const N: usize> ModuleControl for RectifierBank<P, N> {
    fn set_enabled(&mut self, module: u8, enabled: bool) -> Result<(), ControlError> {
        let index = Self::index(module)?;
        info!("rectifier {}: {}", module, if enabled { "on" } else { "off" });
        self.drive(index, enabled);
        Ok(())
    }

    fn reduce_power(&mut self, module: u8, percent: u8) -> Result<(), ControlError> {
        let index = Self::index(module)?;
        if percent > 100 {
            return Err(ControlError::InvalidLevel);
        }
        self.power_pct[index] = percent;
        if percent == 0 {
            self.drive(index, false);
        }
        Ok(())
    }

    fn shutdown_module(&mut self, module: u8) -> Result<(), ControlError> {
        let index = Self::index(module)?;
        self.drive(index, false);
        Ok(())
    }

    fn shutdown_all(&mut self) {
        for index in 0..N {
            self.drive(index, false);
        }
        warn!("all rectifiers off");
    }
}
