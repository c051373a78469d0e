//! Alarm registry
//!
//! Deduplicates alarms, tracks their lifecycle and keeps a bounded history
//! of every raise, acknowledge and clear.

pub mod config;
pub mod history;
pub mod ids;
pub mod registry;
pub mod types;

pub use config::{AlarmConfig, AlarmConfigTable, AlarmOverride, MAX_CONFIG_OVERRIDES};
pub use history::AlarmHistory;
pub use registry::{AlarmRegistry, ALARM_HISTORY_SIZE, MAX_ACTIVE_ALARMS};
pub use types::{
    AlarmError, AlarmHistoryEntry, AlarmMessage, AlarmRecord, AlarmState, Category,
    HistoryAction, Indication, LedPattern, RaiseOutcome, Severity,
};
