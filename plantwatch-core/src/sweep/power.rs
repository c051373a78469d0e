//! Rectifier module sweep

use plantwatch_protocol::PowerModuleReading;

use super::{apply, clear_missing, instances};
use crate::alarm::ids::{CURRENT_HIGH, POWER_OVERLOAD, TEMP_HIGH, VOLTAGE_HIGH, VOLTAGE_LOW};
use crate::alarm::{AlarmRegistry, Category};
use crate::traits::FrameSink;

/// Voltage, current, temperature and power alarms per module
pub fn sweep_power_modules<S: FrameSink>(
    registry: &mut AlarmRegistry<S>,
    modules: &[PowerModuleReading],
) {
    let modules = instances(modules, "power");
    for (i, m) in modules.iter().enumerate() {
        let low = m.voltage_mv < registry.get_threshold(VOLTAGE_LOW + i as u32);
        apply(registry, VOLTAGE_LOW, i, "V_LOW", Category::Power, low);

        let high = m.voltage_mv > registry.get_threshold(VOLTAGE_HIGH + i as u32);
        apply(registry, VOLTAGE_HIGH, i, "V_HIGH", Category::Power, high);

        let current = m.current_ma > registry.get_threshold(CURRENT_HIGH + i as u32);
        apply(registry, CURRENT_HIGH, i, "I_HIGH", Category::Power, current);

        let hot = m.temperature_c as u32 > registry.get_threshold(TEMP_HIGH + i as u32);
        apply(registry, TEMP_HIGH, i, "T_HIGH", Category::Temperature, hot);

        let overload = m.power_mw > registry.get_threshold(POWER_OVERLOAD + i as u32);
        apply(registry, POWER_OVERLOAD, i, "P_OVER", Category::Power, overload);
    }
    for base in [VOLTAGE_LOW, VOLTAGE_HIGH, CURRENT_HIGH, TEMP_HIGH, POWER_OVERLOAD] {
        clear_missing(registry, base, modules.len());
    }
}
