//! Plant-wide load sweep

use super::apply;
use crate::alarm::ids::SYSTEM_FAULT;
use crate::alarm::{AlarmRegistry, Category};
use crate::traits::FrameSink;

/// Overload alarm once the plant has been up for a while
pub fn sweep_system<S: FrameSink>(registry: &mut AlarmRegistry<S>, uptime_s: u32, load_permille: u16) {
    let overloaded =
        uptime_s > 0 && load_permille as u32 > registry.get_threshold(SYSTEM_FAULT);
    apply(registry, SYSTEM_FAULT, 0, "SYS_FAULT", Category::System, overloaded);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm::Severity;
    use crate::testing::RecordingSink;

    #[test]
    fn test_overload() {
        let mut alarms = AlarmRegistry::new(RecordingSink::default());
        sweep_system(&mut alarms, 0, 990);
        assert!(!alarms.is_active(SYSTEM_FAULT));

        sweep_system(&mut alarms, 10, 990);
        let record = alarms.get(SYSTEM_FAULT).unwrap();
        assert_eq!(record.severity, Severity::Emergency);
        assert_eq!(record.message.as_str(), "SYS_FAULT_1");

        sweep_system(&mut alarms, 11, 950);
        assert!(!alarms.is_active(SYSTEM_FAULT));
    }
}
