//! Battery sweep

use plantwatch_protocol::BatteryReading;

use super::{apply, clear_missing, instances};
use crate::alarm::ids::{BATTERY_FAULT, BATTERY_LOW};
use crate::alarm::{AlarmRegistry, Category};
use crate::traits::FrameSink;

/// Low voltage and low capacity alarms per battery string
pub fn sweep_batteries<S: FrameSink>(registry: &mut AlarmRegistry<S>, batteries: &[BatteryReading]) {
    let batteries = instances(batteries, "battery");
    for (i, b) in batteries.iter().enumerate() {
        let low = (b.voltage_mv as u32) < registry.get_threshold(BATTERY_LOW + i as u32);
        apply(registry, BATTERY_LOW, i, "BAT_LOW", Category::Battery, low);

        let fault = (b.capacity_pct as u32) < registry.get_threshold(BATTERY_FAULT + i as u32);
        apply(registry, BATTERY_FAULT, i, "BAT_FAULT", Category::Battery, fault);
    }
    clear_missing(registry, BATTERY_LOW, batteries.len());
    clear_missing(registry, BATTERY_FAULT, batteries.len());
}
