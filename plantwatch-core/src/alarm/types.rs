//! Alarm record types

use plantwatch_protocol::payloads::MessageText;
use serde::{Deserialize, Serialize};

/// Alarm message text (at most 12 ASCII bytes)
pub type AlarmMessage = MessageText;

/// Alarm severity, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Severity {
    Info,
    Warning,
    Critical,
    Emergency,
}

impl Severity {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Severity::Info),
            1 => Some(Severity::Warning),
            2 => Some(Severity::Critical),
            3 => Some(Severity::Emergency),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            Severity::Info => 0,
            Severity::Warning => 1,
            Severity::Critical => 2,
            Severity::Emergency => 3,
        }
    }

    /// Critical or worse
    pub fn is_critical(self) -> bool {
        self >= Severity::Critical
    }
}

/// Subsystem an alarm belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Category {
    Power,
    Battery,
    Ac,
    Dc,
    System,
    Communication,
    Temperature,
    Maintenance,
}

impl Category {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(Category::Power),
            2 => Some(Category::Battery),
            3 => Some(Category::Ac),
            4 => Some(Category::Dc),
            5 => Some(Category::System),
            6 => Some(Category::Communication),
            7 => Some(Category::Temperature),
            8 => Some(Category::Maintenance),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            Category::Power => 1,
            Category::Battery => 2,
            Category::Ac => 3,
            Category::Dc => 4,
            Category::System => 5,
            Category::Communication => 6,
            Category::Temperature => 7,
            Category::Maintenance => 8,
        }
    }
}

/// Lifecycle state of an alarm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlarmState {
    Active,
    Acknowledged,
    Cleared,
}

/// A currently raised alarm
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AlarmRecord {
    pub id: u32,
    pub severity: Severity,
    pub category: Category,
    pub state: AlarmState,
    /// Seconds since boot
    pub raised_at_s: u32,
    /// Operator that acknowledged the alarm
    pub acknowledged_by: Option<u8>,
    pub acknowledged_at_s: Option<u32>,
    pub message: AlarmMessage,
}

/// What happened to an alarm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HistoryAction {
    Raised,
    Acknowledged,
    Cleared,
}

/// One immutable line of alarm history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AlarmHistoryEntry {
    pub alarm_id: u32,
    /// Severity at the time of the action
    pub severity: Severity,
    pub timestamp_s: u32,
    pub action: HistoryAction,
}

/// Errors from alarm registry operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlarmError {
    /// Active set or config override table is full
    CapacityExceeded,
    /// Message longer than 12 bytes
    MessageTooLong,
    /// Message is not NUL-free ASCII
    InvalidMessage,
}

/// Result of a successful raise
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RaiseOutcome {
    /// New record inserted
    Raised,
    /// Id was already active; nothing changed
    AlreadyActive,
}

/// Output pattern for an indicator LED
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LedPattern {
    Off,
    Solid,
    Blink,
}

/// Front-panel indication derived from the active set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Indication {
    /// Blinks for critical alarms, solid for any other alarm
    pub alarm: LedPattern,
    /// Solid when healthy, blinks while anything is active
    pub status: LedPattern,
}
