//! Producer sweeps
//!
//! Each sweep compares one subsystem's readings against the registry's
//! per-id configuration and raises or clears `LABEL_n` alarms, one id per
//! instance inside the kind's block.

use core::fmt::Write;

use heapless::{String, Vec};
use plantwatch_protocol::payloads::MESSAGE_CAPACITY;
use plantwatch_protocol::{AcPhaseReading, BatteryReading, DcCircuitReading, PowerModuleReading};

use crate::alarm::ids::{instance_id, MAX_INSTANCES};
use crate::alarm::{AlarmRegistry, Category};
use crate::traits::FrameSink;

pub mod ac;
pub mod battery;
pub mod dc;
pub mod power;
pub mod system;

pub use ac::sweep_ac;
pub use battery::sweep_batteries;
pub use dc::sweep_dc;
pub use power::sweep_power_modules;
pub use system::sweep_system;

/// Latest readings for every subsystem
#[derive(Debug, Clone, Default)]
pub struct PlantReadings {
    pub modules: Vec<PowerModuleReading, MAX_INSTANCES>,
    pub batteries: Vec<BatteryReading, MAX_INSTANCES>,
    pub ac_phases: Vec<AcPhaseReading, MAX_INSTANCES>,
    pub dc_circuits: Vec<DcCircuitReading, MAX_INSTANCES>,
    /// DC load relative to plant capacity (‰)
    pub system_load_permille: u16,
    pub generator_running: bool,
}

/// Run every producer once
pub fn sweep_all<S: FrameSink>(
    registry: &mut AlarmRegistry<S>,
    readings: &PlantReadings,
    uptime_s: u32,
) {
    sweep_power_modules(registry, &readings.modules);
    sweep_batteries(registry, &readings.batteries);
    sweep_ac(registry, &readings.ac_phases);
    sweep_dc(registry, &readings.dc_circuits);
    sweep_system(registry, uptime_s, readings.system_load_permille);
}

/// Readings that fit in an alarm block; extras are logged and dropped
pub(crate) fn instances<'a, T>(readings: &'a [T], kind: &str) -> &'a [T] {
    if readings.len() > MAX_INSTANCES {
        warn!(
            "{=str}: {=usize} readings, only {=usize} tracked",
            kind,
            readings.len(),
            MAX_INSTANCES
        );
        &readings[..MAX_INSTANCES]
    } else {
        readings
    }
}

/// Clear every instance of the kind at `base` from `present` on
///
/// Those instances have no reading this sweep, so nothing would clear them.
pub(crate) fn clear_missing<S: FrameSink>(registry: &mut AlarmRegistry<S>, base: u32, present: usize) {
    for index in present..MAX_INSTANCES {
        if let Some(id) = instance_id(base, index) {
            registry.clear(id);
        }
    }
}

/// Drive instance `index` of the alarm kind at `base` from `condition`
///
/// Raises `LABEL_<index + 1>` when the condition holds, the id is enabled and
/// it is not already active. Clears it once the condition is gone.
pub(crate) fn apply<S: FrameSink>(
    registry: &mut AlarmRegistry<S>,
    base: u32,
    index: usize,
    label: &str,
    category: Category,
    condition: bool,
) {
    let Some(id) = instance_id(base, index) else {
        return;
    };

    if !condition {
        registry.clear(id);
        return;
    }
    if registry.is_active(id) || !registry.get_enabled(id) {
        return;
    }

    let mut message: String<MESSAGE_CAPACITY> = String::new();
    if write!(message, "{}_{}", label, index + 1).is_err() {
        warn!("alarm {=u32}: label does not fit", id);
        return;
    }
    let severity = registry.get_severity(id);
    if let Err(e) = registry.raise(id, severity, category, &message) {
        warn!("alarm {=u32} not raised: {}", id, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm::ids::*;
    use crate::alarm::{HistoryAction, Severity};
    use crate::testing::RecordingSink;

    fn battery(voltage_mv: u16, capacity_pct: u8) -> BatteryReading {
        BatteryReading {
            battery_id: 0,
            voltage_mv,
            current_ma: 1_000,
            temperature_c: 25,
            capacity_pct,
            charging: true,
            test_running: false,
        }
    }

    #[test]
    fn test_battery_low_scenario() {
        let mut alarms = AlarmRegistry::new(RecordingSink::default());

        alarms.update_time(1_000);
        sweep_batteries(&mut alarms, &[battery(9_500, 80)]);
        let record = alarms.get(BATTERY_LOW).unwrap();
        assert_eq!(record.severity, Severity::Warning);
        assert_eq!(record.message.as_str(), "BAT_LOW_1");

        alarms.update_time(2_000);
        sweep_batteries(&mut alarms, &[battery(11_000, 80)]);
        assert!(!alarms.is_active(BATTERY_LOW));

        let actions: std::vec::Vec<HistoryAction> =
            alarms.history().iter().map(|e| e.action).collect();
        assert_eq!(actions, [HistoryAction::Raised, HistoryAction::Cleared]);
    }

    #[test]
    fn test_disabled_kind_not_raised() {
        let mut alarms = AlarmRegistry::new(RecordingSink::default());
        alarms.set_enabled(BATTERY_LOW, false).unwrap();
        sweep_batteries(&mut alarms, &[battery(9_500, 80), battery(9_000, 80)]);
        assert_eq!(alarms.active_count(), 0);
    }

    #[test]
    fn test_instances_use_own_ids() {
        let mut alarms = AlarmRegistry::new(RecordingSink::default());
        sweep_batteries(&mut alarms, &[battery(12_000, 80), battery(9_000, 5)]);
        assert!(!alarms.is_active(BATTERY_LOW));
        assert!(alarms.is_active(BATTERY_LOW + 1));
        assert!(alarms.is_active(BATTERY_FAULT + 1));
        assert_eq!(alarms.get(BATTERY_FAULT + 1).unwrap().message.as_str(), "BAT_FAULT_2");
    }

    #[test]
    fn test_extra_instances_skipped() {
        let mut alarms = AlarmRegistry::new(RecordingSink::default());
        let low = [battery(9_000, 80); MAX_INSTANCES + 2];
        sweep_batteries(&mut alarms, &low);
        assert_eq!(alarms.active_count(), MAX_INSTANCES);
        assert!(alarms.is_active(BATTERY_LOW + 9));
        assert_eq!(alarms.get(BATTERY_LOW + 9).unwrap().message.as_str(), "BAT_LOW_10");
        assert!(!alarms.is_active(BATTERY_FAULT));
    }

    #[test]
    fn test_vanished_battery_alarms_clear() {
        let mut alarms = AlarmRegistry::new(RecordingSink::default());
        sweep_batteries(&mut alarms, &[battery(12_000, 80), battery(9_000, 5)]);
        assert_eq!(alarms.active_count(), 2);

        // The second string stops reporting
        sweep_batteries(&mut alarms, &[battery(12_000, 80)]);
        assert_eq!(alarms.active_count(), 0);
        let cleared = alarms
            .history()
            .iter()
            .filter(|e| e.action == HistoryAction::Cleared)
            .count();
        assert_eq!(cleared, 2);
    }

    #[test]
    fn test_sweep_all_quiet_plant() {
        let mut alarms = AlarmRegistry::new(RecordingSink::default());
        let mut readings = PlantReadings::default();
        readings
            .modules
            .push(PowerModuleReading {
                module_id: 0,
                voltage_mv: 53_500,
                current_ma: 20_000,
                power_mw: 1_070_000,
                temperature_c: 35,
                status: 1,
                fault_flags: 0,
            })
            .unwrap();
        readings.batteries.push(battery(13_000, 90)).unwrap();
        readings
            .ac_phases
            .push(AcPhaseReading {
                phase_id: 0,
                voltage_dv: 2_300,
                current_da: 50,
                frequency_dhz: 500,
                power_w: 1_150,
                status: 1,
            })
            .unwrap();
        readings.system_load_permille = 400;

        sweep_all(&mut alarms, &readings, 60);
        assert_eq!(alarms.active_count(), 0);
    }
}
