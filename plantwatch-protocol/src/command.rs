//! Inbound commands and their responses

use crate::payloads::{Field, PayloadError};

/// Subsystem a command addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Target {
    PowerModule,
    Battery,
    System,
    Alarms,
    Safety,
}

// Wire format values
const TARGET_POWER_MODULE: u8 = 1;
const TARGET_BATTERY: u8 = 2;
const TARGET_SYSTEM: u8 = 3;
const TARGET_ALARMS: u8 = 4;
const TARGET_SAFETY: u8 = 5;

impl Target {
    /// Parse a target from its wire byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            TARGET_POWER_MODULE => Some(Target::PowerModule),
            TARGET_BATTERY => Some(Target::Battery),
            TARGET_SYSTEM => Some(Target::System),
            TARGET_ALARMS => Some(Target::Alarms),
            TARGET_SAFETY => Some(Target::Safety),
            _ => None,
        }
    }

    /// Convert to wire byte
    pub fn to_byte(self) -> u8 {
        match self {
            Target::PowerModule => TARGET_POWER_MODULE,
            Target::Battery => TARGET_BATTERY,
            Target::System => TARGET_SYSTEM,
            Target::Alarms => TARGET_ALARMS,
            Target::Safety => TARGET_SAFETY,
        }
    }
}

/// What to do with the target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Action {
    Get,
    Set,
    Start,
    Stop,
}

impl Action {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Action::Get),
            1 => Some(Action::Set),
            2 => Some(Action::Start),
            3 => Some(Action::Stop),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            Action::Get => 0,
            Action::Set => 1,
            Action::Start => 2,
            Action::Stop => 3,
        }
    }
}

/// Command from the supervisory host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Command {
    /// Echoed back in the response
    pub command_id: u8,
    pub target: Target,
    /// Module or battery index where the target has several
    pub instance: u8,
    pub action: Action,
    pub parameter: u8,
}

impl Command {
    pub const SIZE: usize = 5;

    pub fn encode(&self) -> [u8; Self::SIZE] {
        [
            self.command_id,
            self.target.to_byte(),
            self.instance,
            self.action.to_byte(),
            self.parameter,
        ]
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, PayloadError> {
        if bytes.len() != Self::SIZE {
            return Err(PayloadError::WrongLength {
                expected: Self::SIZE as u8,
                actual: bytes.len().min(u8::MAX as usize) as u8,
            });
        }
        Ok(Self {
            command_id: bytes[0],
            target: Target::from_byte(bytes[1]).ok_or(PayloadError::OutOfRange(Field::Target))?,
            instance: bytes[2],
            action: Action::from_byte(bytes[3]).ok_or(PayloadError::OutOfRange(Field::Action))?,
            parameter: bytes[4],
        })
    }
}

/// Outcome of a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResponseStatus {
    Ok,
    /// Understood but refused (bad instance or parameter)
    Rejected,
    /// Target/action pair has no handler
    Unsupported,
}

impl ResponseStatus {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(ResponseStatus::Ok),
            1 => Some(ResponseStatus::Rejected),
            2 => Some(ResponseStatus::Unsupported),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            ResponseStatus::Ok => 0,
            ResponseStatus::Rejected => 1,
            ResponseStatus::Unsupported => 2,
        }
    }
}

/// Reply to a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Response {
    pub command_id: u8,
    pub status: ResponseStatus,
    /// Requested value for `Get`, otherwise zero
    pub value: u32,
}

impl Response {
    pub const SIZE: usize = 6;

    /// Successful reply carrying a value
    pub fn ok(command_id: u8, value: u32) -> Self {
        Self {
            command_id,
            status: ResponseStatus::Ok,
            value,
        }
    }

    pub fn rejected(command_id: u8) -> Self {
        Self {
            command_id,
            status: ResponseStatus::Rejected,
            value: 0,
        }
    }

    pub fn unsupported(command_id: u8) -> Self {
        Self {
            command_id,
            status: ResponseStatus::Unsupported,
            value: 0,
        }
    }

    pub fn encode(&self) -> [u8; Self::SIZE] {
        let value = self.value.to_le_bytes();
        [
            self.command_id,
            self.status.to_byte(),
            value[0],
            value[1],
            value[2],
            value[3],
        ]
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, PayloadError> {
        if bytes.len() != Self::SIZE {
            return Err(PayloadError::WrongLength {
                expected: Self::SIZE as u8,
                actual: bytes.len().min(u8::MAX as usize) as u8,
            });
        }
        Ok(Self {
            command_id: bytes[0],
            status: ResponseStatus::from_byte(bytes[1])
                .ok_or(PayloadError::OutOfRange(Field::Status))?,
            value: u32::from_le_bytes([bytes[2], bytes[3], bytes[4], bytes[5]]),
        })
    }
}
