//! Predefined alarm ids
//!
//! Every alarm kind owns a block of [`ALARM_BLOCK_SIZE`] ids. Instance `i`
//! (0-based) of a kind uses `base + i`, so at most ten instances of any kind
//! can be tracked without colliding with the next block.

use super::types::Severity;

/// Ids reserved per alarm kind
pub const ALARM_BLOCK_SIZE: u32 = 10;

/// Highest instance count per kind
pub const MAX_INSTANCES: usize = ALARM_BLOCK_SIZE as usize;

// Power (1000s)
pub const VOLTAGE_LOW: u32 = 1000;
pub const VOLTAGE_HIGH: u32 = 1010;
pub const CURRENT_HIGH: u32 = 1020;
pub const TEMP_HIGH: u32 = 1030;
pub const POWER_OVERLOAD: u32 = 1040;
pub const COMM_FAULT: u32 = 1050;

// Battery (2000s)
pub const BATTERY_LOW: u32 = 2000;
pub const BATTERY_FAULT: u32 = 2010;

// AC (3000s)
pub const AC_FAULT: u32 = 3000;
pub const PHASE_LOSS: u32 = 3010;

// DC (4000s)
pub const DC_FAULT: u32 = 4000;

// System (5000s)
pub const SYSTEM_FAULT: u32 = 5000;
pub const SAFETY_CRITICAL: u32 = 5010;
pub const SAFETY_EMERGENCY: u32 = 5020;
pub const EMERGENCY_SHUTDOWN: u32 = 5030;

// Maintenance (6000s)
pub const MAINTENANCE: u32 = 6000;

/// Default per-kind settings: (base id, severity, threshold)
pub(crate) const DEFAULTS: [(u32, Severity, u32); 16] = [
    (VOLTAGE_LOW, Severity::Warning, 45_000),
    (VOLTAGE_HIGH, Severity::Critical, 55_000),
    (CURRENT_HIGH, Severity::Critical, 50_000),
    (TEMP_HIGH, Severity::Warning, 60),
    (POWER_OVERLOAD, Severity::Critical, 2_400_000),
    (COMM_FAULT, Severity::Warning, 0),
    (BATTERY_LOW, Severity::Warning, 10_000),
    (BATTERY_FAULT, Severity::Critical, 10),
    (AC_FAULT, Severity::Critical, 0),
    (PHASE_LOSS, Severity::Critical, 0),
    (DC_FAULT, Severity::Warning, 0),
    (SYSTEM_FAULT, Severity::Emergency, 950),
    (SAFETY_CRITICAL, Severity::Critical, 0),
    (SAFETY_EMERGENCY, Severity::Emergency, 0),
    (EMERGENCY_SHUTDOWN, Severity::Emergency, 0),
    (MAINTENANCE, Severity::Info, 0),
];

/// Id of instance `index` of the kind starting at `base`
///
/// Returns `None` once the block is exhausted.
pub const fn instance_id(base: u32, index: usize) -> Option<u32> {
    if index < MAX_INSTANCES {
        Some(base + index as u32)
    } else {
        None
    }
}

/// First id of the block containing `id`
pub const fn block_base(id: u32) -> u32 {
    id - id % ALARM_BLOCK_SIZE
}
