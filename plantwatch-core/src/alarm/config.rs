//! Per-id alarm configuration
//!
//! The table is permanent: it outlives raise/clear cycles and is what the
//! producer sweeps consult before raising anything.

use heapless::LinearMap;
use serde::{Deserialize, Serialize};

use super::ids::{block_base, DEFAULTS};
use super::types::{AlarmError, Severity};

/// Maximum number of ids with settings that differ from the defaults
pub const MAX_CONFIG_OVERRIDES: usize = 32;

/// Settings for one alarm id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AlarmConfig {
    pub enabled: bool,
    pub severity: Severity,
    /// Meaning depends on the alarm kind (mV, mA, °C, mW, %, ‰)
    pub threshold: u32,
}

impl AlarmConfig {
    /// Settings for ids outside every predefined block
    pub const UNKNOWN: Self = Self {
        enabled: true,
        severity: Severity::Warning,
        threshold: 0,
    };

    /// Built-in settings for `id`, falling back to its block base
    pub fn default_for(id: u32) -> Self {
        Self::builtin(id)
            .or_else(|| Self::builtin(block_base(id)))
            .unwrap_or(Self::UNKNOWN)
    }

    fn builtin(id: u32) -> Option<Self> {
        DEFAULTS
            .iter()
            .find(|(base, _, _)| *base == id)
            .map(|&(_, severity, threshold)| Self {
                enabled: true,
                severity,
                threshold,
            })
    }
}

/// A stored deviation from the built-in settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AlarmOverride {
    pub id: u32,
    pub config: AlarmConfig,
}

/// Defaults plus a bounded set of overrides
#[derive(Debug, Clone, Default)]
pub struct AlarmConfigTable {
    overrides: LinearMap<u32, AlarmConfig, MAX_CONFIG_OVERRIDES>,
}

impl AlarmConfigTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Effective settings for `id`
    ///
    /// Lookup order: exact override, block override, built-in default.
    pub fn get(&self, id: u32) -> AlarmConfig {
        self.overrides
            .get(&id)
            .or_else(|| self.overrides.get(&block_base(id)))
            .copied()
            .unwrap_or_else(|| AlarmConfig::default_for(id))
    }

    pub fn enabled(&self, id: u32) -> bool {
        self.get(id).enabled
    }

    pub fn severity(&self, id: u32) -> Severity {
        self.get(id).severity
    }

    pub fn threshold(&self, id: u32) -> u32 {
        self.get(id).threshold
    }

    pub fn set_enabled(&mut self, id: u32, enabled: bool) -> Result<(), AlarmError> {
        self.update(id, |config| config.enabled = enabled)
    }

    pub fn set_severity(&mut self, id: u32, severity: Severity) -> Result<(), AlarmError> {
        self.update(id, |config| config.severity = severity)
    }

    pub fn set_threshold(&mut self, id: u32, threshold: u32) -> Result<(), AlarmError> {
        self.update(id, |config| config.threshold = threshold)
    }

    /// Replace the settings for `id` outright
    pub fn set(&mut self, id: u32, config: AlarmConfig) -> Result<(), AlarmError> {
        self.update(id, |slot| *slot = config)
    }

    /// Stored overrides, in no particular order
    pub fn overrides(&self) -> impl Iterator<Item = AlarmOverride> + '_ {
        self.overrides
            .iter()
            .map(|(&id, &config)| AlarmOverride { id, config })
    }

    /// Drop every override
    pub fn reset_to_defaults(&mut self) {
        self.overrides.clear();
    }

    fn update(&mut self, id: u32, f: impl FnOnce(&mut AlarmConfig)) -> Result<(), AlarmError> {
        let mut config = self.get(id);
        f(&mut config);

        if let Some(slot) = self.overrides.get_mut(&id) {
            *slot = config;
            return Ok(());
        }
        self.overrides
            .insert(id, config)
            .map(|_| ())
            .map_err(|_| AlarmError::CapacityExceeded)
    }
}
