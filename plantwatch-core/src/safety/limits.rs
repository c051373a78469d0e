//! Safety limits

use serde::{Deserialize, Serialize};

/// Errors from limit updates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LimitError {
    /// Minimum above maximum
    InvertedRange,
}

/// Operating envelope for every rectifier module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SafetyLimits {
    voltage_min_mv: u32,
    voltage_max_mv: u32,
    current_max_ma: u32,
    temperature_max_c: u8,
    power_max_mw: u32,
}

impl Default for SafetyLimits {
    fn default() -> Self {
        Self::new()
    }
}

impl SafetyLimits {
    /// 40-60 V, 120 A, 80 °C, 3 kW
    pub const fn new() -> Self {
        Self {
            voltage_min_mv: 40_000,
            voltage_max_mv: 60_000,
            current_max_ma: 120_000,
            temperature_max_c: 80,
            power_max_mw: 3_000_000,
        }
    }

    pub fn set_voltage_limits(&mut self, min_mv: u32, max_mv: u32) -> Result<(), LimitError> {
        if min_mv > max_mv {
            return Err(LimitError::InvertedRange);
        }
        self.voltage_min_mv = min_mv;
        self.voltage_max_mv = max_mv;
        Ok(())
    }

    pub fn set_current_limit(&mut self, max_ma: u32) {
        self.current_max_ma = max_ma;
    }

    pub fn set_temperature_limit(&mut self, max_c: u8) {
        self.temperature_max_c = max_c;
    }

    pub fn set_power_limit(&mut self, max_mw: u32) {
        self.power_max_mw = max_mw;
    }

    pub fn voltage_min_mv(&self) -> u32 {
        self.voltage_min_mv
    }

    pub fn voltage_max_mv(&self) -> u32 {
        self.voltage_max_mv
    }

    pub fn current_max_ma(&self) -> u32 {
        self.current_max_ma
    }

    pub fn temperature_max_c(&self) -> u8 {
        self.temperature_max_c
    }

    pub fn power_max_mw(&self) -> u32 {
        self.power_max_mw
    }

    pub fn voltage_ok(&self, voltage_mv: u32) -> bool {
        (self.voltage_min_mv..=self.voltage_max_mv).contains(&voltage_mv)
    }

    /// Check invariants of limits that came from outside (e.g. flash)
    pub fn validate(&self) -> Result<(), LimitError> {
        if self.voltage_min_mv > self.voltage_max_mv {
            return Err(LimitError::InvertedRange);
        }
        Ok(())
    }
}
