//! DC load circuit sweep

use core::ops::RangeInclusive;

use plantwatch_protocol::DcCircuitReading;

use super::{apply, clear_missing, instances};
use crate::alarm::ids::DC_FAULT;
use crate::alarm::{AlarmRegistry, Category};
use crate::traits::FrameSink;

/// Acceptable bus voltage at an enabled breaker (mV)
pub const DC_VOLTAGE_RANGE_MV: RangeInclusive<u32> = 45_000..=55_000;

/// Bus voltage alarm per enabled circuit
///
/// A switched-off circuit never alarms and clears any alarm it had.
pub fn sweep_dc<S: FrameSink>(registry: &mut AlarmRegistry<S>, circuits: &[DcCircuitReading]) {
    let circuits = instances(circuits, "dc");
    for (i, c) in circuits.iter().enumerate() {
        let fault = c.enabled && !DC_VOLTAGE_RANGE_MV.contains(&c.voltage_mv);
        apply(registry, DC_FAULT, i, "DC_FAULT", Category::Dc, fault);
    }
    clear_missing(registry, DC_FAULT, circuits.len());
}
