//! Safety monitoring
//!
//! Aggregates electrical, link and health checks into one escalating
//! plant state and can force a protective shutdown.

pub mod limits;
pub mod monitor;
pub mod simulated;

pub use limits::{LimitError, SafetyLimits};
pub use monitor::{
    Check, InputSource, SafetyCheckResult, SafetyMonitor, SafetyState, SAFETY_CHECK_INTERVAL_MS,
};
pub use simulated::SimulatedPlant;
