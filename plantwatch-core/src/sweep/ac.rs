//! AC mains sweep

use core::ops::RangeInclusive;

use plantwatch_protocol::AcPhaseReading;

use super::{apply, clear_missing, instances};
use crate::alarm::ids::{AC_FAULT, PHASE_LOSS};
use crate::alarm::{AlarmRegistry, Category};
use crate::traits::FrameSink;

/// Acceptable phase voltage (V × 10)
pub const AC_VOLTAGE_RANGE_DV: RangeInclusive<u16> = 2_000..=2_500;

/// Acceptable mains frequency (Hz × 10)
pub const AC_FREQUENCY_RANGE_DHZ: RangeInclusive<u16> = 450..=550;

/// Voltage and frequency alarms per phase
pub fn sweep_ac<S: FrameSink>(registry: &mut AlarmRegistry<S>, phases: &[AcPhaseReading]) {
    let phases = instances(phases, "ac");
    for (i, p) in phases.iter().enumerate() {
        let fault = !AC_VOLTAGE_RANGE_DV.contains(&p.voltage_dv);
        apply(registry, AC_FAULT, i, "AC_FAULT", Category::Ac, fault);

        let lost = !AC_FREQUENCY_RANGE_DHZ.contains(&p.frequency_dhz);
        apply(registry, PHASE_LOSS, i, "PHASE", Category::Ac, lost);
    }
    clear_missing(registry, AC_FAULT, phases.len());
    clear_missing(registry, PHASE_LOSS, phases.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingSink;

    fn phase(voltage_dv: u16, frequency_dhz: u16) -> AcPhaseReading {
        AcPhaseReading {
            phase_id: 0,
            voltage_dv,
            current_da: 100,
            frequency_dhz,
            power_w: 2_300,
            status: 1,
        }
    }

    #[test]
    fn test_phase_faults() {
        let mut alarms = AlarmRegistry::new(RecordingSink::default());
        sweep_ac(
            &mut alarms,
            &[phase(2_300, 500), phase(1_900, 500), phase(2_300, 0)],
        );
        assert_eq!(alarms.active_count(), 2);
        assert!(alarms.is_active(AC_FAULT + 1));
        // A dead phase reads as zero frequency
        assert!(alarms.is_active(PHASE_LOSS + 2));
        assert_eq!(alarms.get(PHASE_LOSS + 2).unwrap().message.as_str(), "PHASE_3");
    }

    #[test]
    fn test_band_edges_accepted() {
        let mut alarms = AlarmRegistry::new(RecordingSink::default());
        sweep_ac(&mut alarms, &[phase(2_000, 450), phase(2_500, 550)]);
        assert_eq!(alarms.active_count(), 0);
    }
}
