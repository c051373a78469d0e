//! Typed payloads carried inside frames
//!
//! Every payload has a fixed little-endian layout and a valid-range contract.
//! Decoding rejects values outside the physical range even when the frame
//! checksum passed, so corrupt readings never reach the alarm or safety logic.

use heapless::String;

use crate::command::{Command, Response};
use crate::frame::{Frame, FrameError};

// Frame type tags
pub const MSG_POWER_MODULE: u8 = 0x01;
pub const MSG_BATTERY: u8 = 0x02;
pub const MSG_AC_PHASE: u8 = 0x03;
pub const MSG_DC_CIRCUIT: u8 = 0x04;
pub const MSG_ALARM: u8 = 0x05;
pub const MSG_SYSTEM_STATUS: u8 = 0x06;
pub const MSG_COMMAND: u8 = 0x07;
pub const MSG_RESPONSE: u8 = 0x08;

/// Maximum alarm message length carried in a notification
pub const MESSAGE_CAPACITY: usize = 12;

/// Maximum DC load name length
pub const LOAD_NAME_LEN: usize = 6;

/// Module voltage limit (mV)
pub const MAX_MODULE_VOLTAGE_MV: u32 = 100_000;
/// Module current limit (mA)
pub const MAX_MODULE_CURRENT_MA: u32 = 100_000;
/// Module temperature limit (°C)
pub const MAX_MODULE_TEMPERATURE_C: u8 = 150;
/// Battery voltage limit (mV)
pub const MAX_BATTERY_VOLTAGE_MV: u16 = 15_000;
/// Battery current limit (mA)
pub const MAX_BATTERY_CURRENT_MA: u16 = 10_000;
/// Battery temperature limit (°C)
pub const MAX_BATTERY_TEMPERATURE_C: u8 = 100;
/// AC voltage limit (V × 10)
pub const MAX_AC_VOLTAGE_DV: u16 = 5_000;
/// AC current limit (A × 10)
pub const MAX_AC_CURRENT_DA: u16 = 1_000;
/// AC frequency limit (Hz × 10)
pub const MAX_AC_FREQUENCY_DHZ: u16 = 1_000;
/// AC power limit (W)
pub const MAX_AC_POWER_W: u32 = 100_000;
/// System load limit (‰)
pub const MAX_SYSTEM_LOAD_PERMILLE: u16 = 1_000;

/// Alarm message text as carried on the wire
pub type MessageText = WireText<MESSAGE_CAPACITY>;

/// DC load name as carried on the wire
pub type LoadName = WireText<LOAD_NAME_LEN>;

/// ASCII text of at most `N` bytes with no NUL
///
/// Text fields are NUL-padded on the wire, so these are exactly the strings
/// that decode back to themselves.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WireText<const N: usize>(String<N>);

impl<const N: usize> WireText<N> {
    pub const fn new() -> Self {
        Self(String::new())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl<const N: usize> TryFrom<&str> for WireText<N> {
    type Error = PayloadError;

    fn try_from(text: &str) -> Result<Self, PayloadError> {
        if text.bytes().any(|b| !b.is_ascii() || b == 0) {
            return Err(PayloadError::InvalidText);
        }
        let mut out = String::new();
        out.push_str(text).map_err(|_| PayloadError::InvalidText)?;
        Ok(Self(out))
    }
}

impl<const N: usize> core::ops::Deref for WireText<N> {
    type Target = str;

    fn deref(&self) -> &str {
        self.as_str()
    }
}

/// Frame type tags as an enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameType {
    PowerModule,
    Battery,
    AcPhase,
    DcCircuit,
    AlarmNotification,
    SystemStatus,
    Command,
    Response,
}

impl FrameType {
    /// Parse a type tag
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            MSG_POWER_MODULE => Some(FrameType::PowerModule),
            MSG_BATTERY => Some(FrameType::Battery),
            MSG_AC_PHASE => Some(FrameType::AcPhase),
            MSG_DC_CIRCUIT => Some(FrameType::DcCircuit),
            MSG_ALARM => Some(FrameType::AlarmNotification),
            MSG_SYSTEM_STATUS => Some(FrameType::SystemStatus),
            MSG_COMMAND => Some(FrameType::Command),
            MSG_RESPONSE => Some(FrameType::Response),
            _ => None,
        }
    }

    /// Convert to the wire tag
    pub fn to_byte(self) -> u8 {
        match self {
            FrameType::PowerModule => MSG_POWER_MODULE,
            FrameType::Battery => MSG_BATTERY,
            FrameType::AcPhase => MSG_AC_PHASE,
            FrameType::DcCircuit => MSG_DC_CIRCUIT,
            FrameType::AlarmNotification => MSG_ALARM,
            FrameType::SystemStatus => MSG_SYSTEM_STATUS,
            FrameType::Command => MSG_COMMAND,
            FrameType::Response => MSG_RESPONSE,
        }
    }
}

/// Field that failed a range check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Field {
    Voltage,
    Current,
    Temperature,
    Capacity,
    Frequency,
    Power,
    Flag,
    Severity,
    Category,
    OperationMode,
    SystemLoad,
    SafetyState,
    Target,
    Action,
    Status,
}

/// Errors from typed payload parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PayloadError {
    /// Type tag not in the closed set
    UnknownType(u8),
    /// Payload size does not match the fixed layout
    WrongLength { expected: u8, actual: u8 },
    /// A field is outside its physical range
    OutOfRange(Field),
    /// Text field is not NUL-padded ASCII
    InvalidText,
}

fn expect_len(bytes: &[u8], expected: usize) -> Result<(), PayloadError> {
    if bytes.len() != expected {
        return Err(PayloadError::WrongLength {
            expected: expected as u8,
            actual: bytes.len().min(u8::MAX as usize) as u8,
        });
    }
    Ok(())
}

fn check_max<T: PartialOrd>(value: T, max: T, field: Field) -> Result<T, PayloadError> {
    if value > max {
        return Err(PayloadError::OutOfRange(field));
    }
    Ok(value)
}

fn read_flag(byte: u8) -> Result<bool, PayloadError> {
    match byte {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(PayloadError::OutOfRange(Field::Flag)),
    }
}

fn read_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

fn write_u16(out: &mut [u8], at: usize, value: u16) {
    out[at..at + 2].copy_from_slice(&value.to_le_bytes());
}

fn write_u32(out: &mut [u8], at: usize, value: u32) {
    out[at..at + 4].copy_from_slice(&value.to_le_bytes());
}

/// Read NUL-padded ASCII text
fn read_text<const N: usize>(bytes: &[u8]) -> Result<WireText<N>, PayloadError> {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    if bytes[end..].iter().any(|&b| b != 0) {
        return Err(PayloadError::InvalidText);
    }
    let text = core::str::from_utf8(&bytes[..end]).map_err(|_| PayloadError::InvalidText)?;
    WireText::try_from(text)
}

fn write_text<const N: usize>(out: &mut [u8], text: &WireText<N>) {
    let bytes = text.as_bytes();
    let len = bytes.len().min(out.len());
    out[..len].copy_from_slice(&bytes[..len]);
    out[len..].fill(0);
}

/// Rectifier module reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PowerModuleReading {
    pub module_id: u8,
    /// Output voltage (mV)
    pub voltage_mv: u32,
    /// Output current (mA)
    pub current_ma: u32,
    /// Output power (mW)
    pub power_mw: u32,
    /// Heatsink temperature (°C)
    pub temperature_c: u8,
    /// Status bit flags
    pub status: u8,
    /// Fault bit flags
    pub fault_flags: u8,
}

impl PowerModuleReading {
    pub const SIZE: usize = 16;

    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[0] = self.module_id;
        write_u32(&mut out, 1, self.voltage_mv);
        write_u32(&mut out, 5, self.current_ma);
        write_u32(&mut out, 9, self.power_mw);
        out[13] = self.temperature_c;
        out[14] = self.status;
        out[15] = self.fault_flags;
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, PayloadError> {
        expect_len(bytes, Self::SIZE)?;
        Ok(Self {
            module_id: bytes[0],
            voltage_mv: check_max(read_u32(bytes, 1), MAX_MODULE_VOLTAGE_MV, Field::Voltage)?,
            current_ma: check_max(read_u32(bytes, 5), MAX_MODULE_CURRENT_MA, Field::Current)?,
            power_mw: read_u32(bytes, 9),
            temperature_c: check_max(bytes[13], MAX_MODULE_TEMPERATURE_C, Field::Temperature)?,
            status: bytes[14],
            fault_flags: bytes[15],
        })
    }
}

/// Battery string reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BatteryReading {
    pub battery_id: u8,
    /// Terminal voltage (mV)
    pub voltage_mv: u16,
    /// Charge/discharge current magnitude (mA)
    pub current_ma: u16,
    /// Temperature (°C)
    pub temperature_c: u8,
    /// State of charge (0-100 %)
    pub capacity_pct: u8,
    pub charging: bool,
    /// Battery test in progress
    pub test_running: bool,
}

impl BatteryReading {
    pub const SIZE: usize = 9;

    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[0] = self.battery_id;
        write_u16(&mut out, 1, self.voltage_mv);
        write_u16(&mut out, 3, self.current_ma);
        out[5] = self.temperature_c;
        out[6] = self.capacity_pct;
        out[7] = self.charging as u8;
        out[8] = self.test_running as u8;
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, PayloadError> {
        expect_len(bytes, Self::SIZE)?;
        Ok(Self {
            battery_id: bytes[0],
            voltage_mv: check_max(read_u16(bytes, 1), MAX_BATTERY_VOLTAGE_MV, Field::Voltage)?,
            current_ma: check_max(read_u16(bytes, 3), MAX_BATTERY_CURRENT_MA, Field::Current)?,
            temperature_c: check_max(bytes[5], MAX_BATTERY_TEMPERATURE_C, Field::Temperature)?,
            capacity_pct: check_max(bytes[6], 100, Field::Capacity)?,
            charging: read_flag(bytes[7])?,
            test_running: read_flag(bytes[8])?,
        })
    }
}

/// AC mains phase reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AcPhaseReading {
    pub phase_id: u8,
    /// RMS voltage (V × 10)
    pub voltage_dv: u16,
    /// RMS current (A × 10)
    pub current_da: u16,
    /// Frequency (Hz × 10)
    pub frequency_dhz: u16,
    /// Active power (W)
    pub power_w: u32,
    pub status: u8,
}

impl AcPhaseReading {
    pub const SIZE: usize = 12;

    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[0] = self.phase_id;
        write_u16(&mut out, 1, self.voltage_dv);
        write_u16(&mut out, 3, self.current_da);
        write_u16(&mut out, 5, self.frequency_dhz);
        write_u32(&mut out, 7, self.power_w);
        out[11] = self.status;
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, PayloadError> {
        expect_len(bytes, Self::SIZE)?;
        Ok(Self {
            phase_id: bytes[0],
            voltage_dv: check_max(read_u16(bytes, 1), MAX_AC_VOLTAGE_DV, Field::Voltage)?,
            current_da: check_max(read_u16(bytes, 3), MAX_AC_CURRENT_DA, Field::Current)?,
            frequency_dhz: check_max(read_u16(bytes, 5), MAX_AC_FREQUENCY_DHZ, Field::Frequency)?,
            power_w: check_max(read_u32(bytes, 7), MAX_AC_POWER_W, Field::Power)?,
            status: bytes[11],
        })
    }
}

/// DC load circuit reading
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DcCircuitReading {
    pub circuit_id: u8,
    /// Bus voltage at the breaker (mV)
    pub voltage_mv: u32,
    /// Load current (mA)
    pub current_ma: u32,
    /// Load power (mW)
    pub power_mw: u32,
    pub enabled: bool,
    /// ASCII load label
    pub load_name: LoadName,
}

impl DcCircuitReading {
    pub const SIZE: usize = 20;

    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[0] = self.circuit_id;
        write_u32(&mut out, 1, self.voltage_mv);
        write_u32(&mut out, 5, self.current_ma);
        write_u32(&mut out, 9, self.power_mw);
        out[13] = self.enabled as u8;
        write_text(&mut out[14..20], &self.load_name);
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, PayloadError> {
        expect_len(bytes, Self::SIZE)?;
        Ok(Self {
            circuit_id: bytes[0],
            voltage_mv: check_max(read_u32(bytes, 1), MAX_MODULE_VOLTAGE_MV, Field::Voltage)?,
            current_ma: check_max(read_u32(bytes, 5), MAX_MODULE_CURRENT_MA, Field::Current)?,
            power_mw: read_u32(bytes, 9),
            enabled: read_flag(bytes[13])?,
            load_name: read_text(&bytes[14..20])?,
        })
    }
}

/// Alarm raise/clear notification
///
/// Severity and category are carried as their wire bytes; the alarm
/// registry owns their meaning.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AlarmNotification {
    pub alarm_id: u32,
    /// 0=Info, 1=Warning, 2=Critical, 3=Emergency
    pub severity: u8,
    /// 1=Power .. 8=Maintenance
    pub category: u8,
    /// Seconds since boot when the alarm was raised or cleared
    pub timestamp_s: u32,
    pub active: bool,
    pub message: MessageText,
}

impl AlarmNotification {
    pub const SIZE: usize = 23;

    /// Highest valid severity byte
    pub const MAX_SEVERITY: u8 = 3;

    /// Highest valid category byte
    pub const MAX_CATEGORY: u8 = 8;

    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        write_u32(&mut out, 0, self.alarm_id);
        out[4] = self.severity;
        out[5] = self.category;
        write_u32(&mut out, 6, self.timestamp_s);
        out[10] = self.active as u8;
        write_text(&mut out[11..23], &self.message);
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, PayloadError> {
        expect_len(bytes, Self::SIZE)?;
        let category = bytes[5];
        if category == 0 || category > Self::MAX_CATEGORY {
            return Err(PayloadError::OutOfRange(Field::Category));
        }
        Ok(Self {
            alarm_id: read_u32(bytes, 0),
            severity: check_max(bytes[4], Self::MAX_SEVERITY, Field::Severity)?,
            category,
            timestamp_s: read_u32(bytes, 6),
            active: read_flag(bytes[10])?,
            message: read_text(&bytes[11..23])?,
        })
    }
}

/// Plant operation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OperationMode {
    #[default]
    Auto,
    Manual,
    Test,
}

impl OperationMode {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(OperationMode::Auto),
            1 => Some(OperationMode::Manual),
            2 => Some(OperationMode::Test),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            OperationMode::Auto => 0,
            OperationMode::Manual => 1,
            OperationMode::Test => 2,
        }
    }
}

/// Plant-wide status summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SystemStatus {
    pub mains_available: bool,
    pub battery_backup: bool,
    pub generator_running: bool,
    pub operation_mode: OperationMode,
    /// DC load relative to plant capacity (‰)
    pub system_load_permille: u16,
    pub uptime_s: u32,
    /// Safety state wire byte (0=Normal .. 4=Shutdown)
    pub safety_state: u8,
    pub active_alarms: u8,
}

impl SystemStatus {
    pub const SIZE: usize = 12;

    /// Highest valid safety state byte
    pub const MAX_SAFETY_STATE: u8 = 4;

    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[0] = self.mains_available as u8;
        out[1] = self.battery_backup as u8;
        out[2] = self.generator_running as u8;
        out[3] = self.operation_mode.to_byte();
        write_u16(&mut out, 4, self.system_load_permille);
        write_u32(&mut out, 6, self.uptime_s);
        out[10] = self.safety_state;
        out[11] = self.active_alarms;
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, PayloadError> {
        expect_len(bytes, Self::SIZE)?;
        Ok(Self {
            mains_available: read_flag(bytes[0])?,
            battery_backup: read_flag(bytes[1])?,
            generator_running: read_flag(bytes[2])?,
            operation_mode: OperationMode::from_byte(bytes[3])
                .ok_or(PayloadError::OutOfRange(Field::OperationMode))?,
            system_load_permille: check_max(
                read_u16(bytes, 4),
                MAX_SYSTEM_LOAD_PERMILLE,
                Field::SystemLoad,
            )?,
            uptime_s: read_u32(bytes, 6),
            safety_state: check_max(bytes[10], Self::MAX_SAFETY_STATE, Field::SafetyState)?,
            active_alarms: bytes[11],
        })
    }
}

/// Any payload that can travel in a frame
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Payload {
    PowerModule(PowerModuleReading),
    Battery(BatteryReading),
    AcPhase(AcPhaseReading),
    DcCircuit(DcCircuitReading),
    Alarm(AlarmNotification),
    Status(SystemStatus),
    Command(Command),
    Response(Response),
}

impl Payload {
    /// Type tag for this payload
    pub fn frame_type(&self) -> FrameType {
        match self {
            Payload::PowerModule(_) => FrameType::PowerModule,
            Payload::Battery(_) => FrameType::Battery,
            Payload::AcPhase(_) => FrameType::AcPhase,
            Payload::DcCircuit(_) => FrameType::DcCircuit,
            Payload::Alarm(_) => FrameType::AlarmNotification,
            Payload::Status(_) => FrameType::SystemStatus,
            Payload::Command(_) => FrameType::Command,
            Payload::Response(_) => FrameType::Response,
        }
    }

    /// Encode this payload into a frame
    pub fn to_frame(&self) -> Result<Frame, FrameError> {
        let tag = self.frame_type().to_byte();
        match self {
            Payload::PowerModule(p) => Frame::new(tag, &p.encode()),
            Payload::Battery(p) => Frame::new(tag, &p.encode()),
            Payload::AcPhase(p) => Frame::new(tag, &p.encode()),
            Payload::DcCircuit(p) => Frame::new(tag, &p.encode()),
            Payload::Alarm(p) => Frame::new(tag, &p.encode()),
            Payload::Status(p) => Frame::new(tag, &p.encode()),
            Payload::Command(p) => Frame::new(tag, &p.encode()),
            Payload::Response(p) => Frame::new(tag, &p.encode()),
        }
    }

    /// Parse a payload from a decoded frame
    pub fn from_frame(frame: &Frame) -> Result<Self, PayloadError> {
        let bytes = frame.payload.as_slice();
        let frame_type =
            FrameType::from_byte(frame.msg_type).ok_or(PayloadError::UnknownType(frame.msg_type))?;
        Ok(match frame_type {
            FrameType::PowerModule => Payload::PowerModule(PowerModuleReading::decode(bytes)?),
            FrameType::Battery => Payload::Battery(BatteryReading::decode(bytes)?),
            FrameType::AcPhase => Payload::AcPhase(AcPhaseReading::decode(bytes)?),
            FrameType::DcCircuit => Payload::DcCircuit(DcCircuitReading::decode(bytes)?),
            FrameType::AlarmNotification => Payload::Alarm(AlarmNotification::decode(bytes)?),
            FrameType::SystemStatus => Payload::Status(SystemStatus::decode(bytes)?),
            FrameType::Command => Payload::Command(Command::decode(bytes)?),
            FrameType::Response => Payload::Response(Response::decode(bytes)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{Action, ResponseStatus, Target};
    use proptest::prelude::*;

    fn roundtrip(payload: Payload) -> Result<Payload, PayloadError> {
        let frame = payload.to_frame().unwrap();
        let bytes = frame.encode_to_vec().unwrap();
        let decoded = Frame::decode(&bytes).unwrap();
        assert_eq!(decoded.msg_type, payload.frame_type().to_byte());
        Payload::from_frame(&decoded)
    }

    #[test]
    fn test_frame_type_tags() {
        for byte in 1..=8u8 {
            let frame_type = FrameType::from_byte(byte).unwrap();
            assert_eq!(frame_type.to_byte(), byte);
        }
        assert!(FrameType::from_byte(0x00).is_none());
        assert!(FrameType::from_byte(0x09).is_none());
    }

    #[test]
    fn test_power_module_layout() {
        let reading = PowerModuleReading {
            module_id: 2,
            voltage_mv: 53_500,
            current_ma: 45_200,
            power_mw: 2_418_200,
            temperature_c: 41,
            status: 0x01,
            fault_flags: 0,
        };
        let bytes = reading.encode();
        assert_eq!(bytes[0], 2);
        assert_eq!(&bytes[1..5], &53_500u32.to_le_bytes());
        assert_eq!(bytes[13], 41);
        assert_eq!(PowerModuleReading::decode(&bytes), Ok(reading));
    }

    #[test]
    fn test_power_module_voltage_out_of_range() {
        let reading = PowerModuleReading {
            voltage_mv: MAX_MODULE_VOLTAGE_MV + 1,
            ..Default::default()
        };
        assert_eq!(
            PowerModuleReading::decode(&reading.encode()),
            Err(PayloadError::OutOfRange(Field::Voltage))
        );
    }

    #[test]
    fn test_battery_range_checks() {
        let mut bytes = BatteryReading::default().encode();
        bytes[6] = 101;
        assert_eq!(
            BatteryReading::decode(&bytes),
            Err(PayloadError::OutOfRange(Field::Capacity))
        );

        let mut bytes = BatteryReading::default().encode();
        bytes[7] = 2;
        assert_eq!(
            BatteryReading::decode(&bytes),
            Err(PayloadError::OutOfRange(Field::Flag))
        );
    }

    #[test]
    fn test_wrong_length() {
        assert_eq!(
            AcPhaseReading::decode(&[0u8; 11]),
            Err(PayloadError::WrongLength {
                expected: 12,
                actual: 11
            })
        );
    }

    #[test]
    fn test_unknown_type() {
        let frame = Frame::new(0x42, &[]).unwrap();
        assert_eq!(Payload::from_frame(&frame), Err(PayloadError::UnknownType(0x42)));
    }

    #[test]
    fn test_checksum_valid_but_semantically_corrupt() {
        // A well-formed frame whose battery temperature is impossible
        let mut bytes = BatteryReading::default().encode();
        bytes[5] = 200;
        let frame = Frame::new(MSG_BATTERY, &bytes).unwrap();
        let wire = frame.encode_to_vec().unwrap();

        let decoded = Frame::decode(&wire).unwrap();
        assert_eq!(
            Payload::from_frame(&decoded),
            Err(PayloadError::OutOfRange(Field::Temperature))
        );
    }

    #[test]
    fn test_alarm_notification_text() {
        let message = MessageText::try_from("BAT_LOW_1").unwrap();
        let notification = AlarmNotification {
            alarm_id: 2000,
            severity: 1,
            category: 2,
            timestamp_s: 12,
            active: true,
            message,
        };
        let bytes = notification.encode();
        assert_eq!(&bytes[11..20], b"BAT_LOW_1");
        assert_eq!(&bytes[20..23], &[0, 0, 0]);
        assert_eq!(AlarmNotification::decode(&bytes), Ok(notification));
    }

    #[test]
    fn test_wire_text_rejects_what_decode_would() {
        assert_eq!(LoadName::try_from("RACK_1").unwrap().as_str(), "RACK_1");
        assert_eq!(LoadName::try_from(""), Ok(LoadName::new()));
        assert_eq!(LoadName::try_from("RACK\0"), Err(PayloadError::InvalidText));
        assert_eq!(LoadName::try_from("Bäck"), Err(PayloadError::InvalidText));
        assert_eq!(LoadName::try_from("RACK_10"), Err(PayloadError::InvalidText));

        // Anything that can be built survives the wire
        let reading = DcCircuitReading {
            load_name: LoadName::try_from("PUMP A").unwrap(),
            ..Default::default()
        };
        assert_eq!(DcCircuitReading::decode(&reading.encode()), Ok(reading));
    }

    #[test]
    fn test_alarm_notification_rejects_bad_text() {
        let mut bytes = AlarmNotification {
            category: 1,
            ..Default::default()
        }
        .encode();
        bytes[11] = b'A';
        bytes[13] = b'B'; // text resumes after a NUL
        assert_eq!(AlarmNotification::decode(&bytes), Err(PayloadError::InvalidText));

        bytes[13] = 0;
        bytes[12] = 0xC3;
        assert_eq!(AlarmNotification::decode(&bytes), Err(PayloadError::InvalidText));
    }

    #[test]
    fn test_alarm_notification_category_zero_rejected() {
        let bytes = AlarmNotification::default().encode();
        assert_eq!(
            AlarmNotification::decode(&bytes),
            Err(PayloadError::OutOfRange(Field::Category))
        );
    }

    #[test]
    fn test_system_status_mode_checked() {
        let mut bytes = SystemStatus::default().encode();
        bytes[3] = 3;
        assert_eq!(
            SystemStatus::decode(&bytes),
            Err(PayloadError::OutOfRange(Field::OperationMode))
        );
    }

    #[test]
    fn test_command_frame_roundtrip() {
        let command = Command {
            command_id: 7,
            target: Target::Battery,
            instance: 0,
            action: Action::Start,
            parameter: 0,
        };
        assert_eq!(roundtrip(Payload::Command(command)), Ok(Payload::Command(command)));

        let response = Response {
            command_id: 7,
            status: ResponseStatus::Ok,
            value: 1,
        };
        assert_eq!(
            roundtrip(Payload::Response(response)),
            Ok(Payload::Response(response))
        );
    }

    fn ascii_text(max: usize) -> impl Strategy<Value = std::string::String> {
        proptest::string::string_regex(&std::format!("[A-Z0-9_]{{0,{}}}", max)).unwrap()
    }

    fn power_module() -> impl Strategy<Value = Payload> {
        (
            any::<u8>(),
            0..=MAX_MODULE_VOLTAGE_MV,
            0..=MAX_MODULE_CURRENT_MA,
            any::<u32>(),
            0..=MAX_MODULE_TEMPERATURE_C,
            any::<u8>(),
            any::<u8>(),
        )
            .prop_map(|(module_id, v, i, p, t, status, fault_flags)| {
                Payload::PowerModule(PowerModuleReading {
                    module_id,
                    voltage_mv: v,
                    current_ma: i,
                    power_mw: p,
                    temperature_c: t,
                    status,
                    fault_flags,
                })
            })
    }

    fn battery() -> impl Strategy<Value = Payload> {
        (
            any::<u8>(),
            0..=MAX_BATTERY_VOLTAGE_MV,
            0..=MAX_BATTERY_CURRENT_MA,
            0..=MAX_BATTERY_TEMPERATURE_C,
            0..=100u8,
            any::<bool>(),
            any::<bool>(),
        )
            .prop_map(|(battery_id, v, i, t, c, charging, test_running)| {
                Payload::Battery(BatteryReading {
                    battery_id,
                    voltage_mv: v,
                    current_ma: i,
                    temperature_c: t,
                    capacity_pct: c,
                    charging,
                    test_running,
                })
            })
    }

    fn ac_phase() -> impl Strategy<Value = Payload> {
        (
            any::<u8>(),
            0..=MAX_AC_VOLTAGE_DV,
            0..=MAX_AC_CURRENT_DA,
            0..=MAX_AC_FREQUENCY_DHZ,
            0..=MAX_AC_POWER_W,
            any::<u8>(),
        )
            .prop_map(|(phase_id, v, i, f, p, status)| {
                Payload::AcPhase(AcPhaseReading {
                    phase_id,
                    voltage_dv: v,
                    current_da: i,
                    frequency_dhz: f,
                    power_w: p,
                    status,
                })
            })
    }

    fn dc_circuit() -> impl Strategy<Value = Payload> {
        (
            any::<u8>(),
            0..=MAX_MODULE_VOLTAGE_MV,
            0..=MAX_MODULE_CURRENT_MA,
            any::<u32>(),
            any::<bool>(),
            ascii_text(LOAD_NAME_LEN),
        )
            .prop_map(|(circuit_id, v, i, p, enabled, name)| {
                let load_name = LoadName::try_from(name.as_str()).unwrap();
                Payload::DcCircuit(DcCircuitReading {
                    circuit_id,
                    voltage_mv: v,
                    current_ma: i,
                    power_mw: p,
                    enabled,
                    load_name,
                })
            })
    }

    fn alarm() -> impl Strategy<Value = Payload> {
        (
            any::<u32>(),
            0..=AlarmNotification::MAX_SEVERITY,
            1..=AlarmNotification::MAX_CATEGORY,
            any::<u32>(),
            any::<bool>(),
            ascii_text(MESSAGE_CAPACITY),
        )
            .prop_map(|(alarm_id, severity, category, timestamp_s, active, text)| {
                let message = MessageText::try_from(text.as_str()).unwrap();
                Payload::Alarm(AlarmNotification {
                    alarm_id,
                    severity,
                    category,
                    timestamp_s,
                    active,
                    message,
                })
            })
    }

    fn status() -> impl Strategy<Value = Payload> {
        (
            any::<(bool, bool, bool)>(),
            0..=2u8,
            0..=MAX_SYSTEM_LOAD_PERMILLE,
            any::<u32>(),
            0..=SystemStatus::MAX_SAFETY_STATE,
            any::<u8>(),
        )
            .prop_map(|((mains, backup, generator), mode, load, uptime, state, alarms)| {
                Payload::Status(SystemStatus {
                    mains_available: mains,
                    battery_backup: backup,
                    generator_running: generator,
                    operation_mode: OperationMode::from_byte(mode).unwrap(),
                    system_load_permille: load,
                    uptime_s: uptime,
                    safety_state: state,
                    active_alarms: alarms,
                })
            })
    }

    fn command() -> impl Strategy<Value = Payload> {
        (any::<u8>(), 1..=5u8, any::<u8>(), 0..=3u8, any::<u8>()).prop_map(
            |(command_id, target, instance, action, parameter)| {
                Payload::Command(Command {
                    command_id,
                    target: Target::from_byte(target).unwrap(),
                    instance,
                    action: Action::from_byte(action).unwrap(),
                    parameter,
                })
            },
        )
    }

    fn response() -> impl Strategy<Value = Payload> {
        (any::<u8>(), 0..=2u8, any::<u32>()).prop_map(|(command_id, status, value)| {
            Payload::Response(Response {
                command_id,
                status: ResponseStatus::from_byte(status).unwrap(),
                value,
            })
        })
    }

    fn any_payload() -> impl Strategy<Value = Payload> {
        prop_oneof![
            power_module(),
            battery(),
            ac_phase(),
            dc_circuit(),
            alarm(),
            status(),
            command(),
            response(),
        ]
    }

    proptest! {
        #[test]
        fn prop_every_valid_payload_roundtrips(payload in any_payload()) {
            prop_assert_eq!(roundtrip(payload.clone()), Ok(payload));
        }
    }
}
