//! Plant readings for the producer sweeps
//!
//! This board has no analog front end, so every enabled rectifier reports
//! the simulated DC bus. Disabled modules still sit on the bus, so they
//! report its voltage with zero output current.

use plantwatch_core::safety::SimulatedPlant;
use plantwatch_core::sweep::PlantReadings;
use plantwatch_protocol::PowerModuleReading;

/// Rated plant output used for the load figure (mW)
const RATED_POWER_MW: u64 = 4 * 1_500_000;

/// Source of readings for the periodic sweep
pub struct SimulatedReadings {
    plant: SimulatedPlant,
}

impl SimulatedReadings {
    pub fn new(seed: u32) -> Self {
        Self {
            plant: SimulatedPlant::new(seed),
        }
    }

    /// Advance the simulated bus one step and report each module
    pub fn sample(&mut self, enabled: impl Iterator<Item = bool>) -> PlantReadings {
        let voltage_mv = self.plant.voltage_mv.advance().max(0) as u32;
        let current_ma = self.plant.current_ma.advance().max(0) as u32;
        let temperature_c = self.plant.temperature_c.advance().clamp(0, 150) as u8;
        let power_mw = self.plant.power_mw.advance().max(0) as u32;

        let mut readings = PlantReadings::default();
        let mut total_mw: u64 = 0;
        for (module_id, on) in enabled.enumerate() {
            let reading = if on {
                total_mw += power_mw as u64;
                PowerModuleReading {
                    module_id: module_id as u8,
                    voltage_mv,
                    current_ma,
                    power_mw,
                    temperature_c,
                    status: 1,
                    fault_flags: 0,
                }
            } else {
                PowerModuleReading {
                    module_id: module_id as u8,
                    voltage_mv,
                    current_ma: 0,
                    power_mw: 0,
                    temperature_c,
                    status: 0,
                    fault_flags: 0,
                }
            };
            if readings.modules.push(reading).is_err() {
                break;
            }
        }
        readings.system_load_permille = (total_mw * 1_000 / RATED_POWER_MW).min(1_000) as u16;
        readings
    }
}
