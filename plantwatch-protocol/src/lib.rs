//! Plant monitoring wire protocol
//!
//! Framing, typed payloads and the receive queue for the link between the
//! plant controller and its supervisory host.
//!
//! # Frame Format
//!
//! ```text
//! ┌──────┬──────┬──────┬────────┬─────────────┬──────────┐
//! │ 0xAA │ 0x55 │ TYPE │ LENGTH │ PAYLOAD     │ CHECKSUM │
//! │ 1B   │ 1B   │ 1B   │ 1B     │ 0–59B       │ 1B       │
//! └──────┴──────┴──────┴────────┴─────────────┴──────────┘
//! ```
//!
//! The checksum is the XOR of every byte from the header through the payload.
//! The codec checks framing only; [`payloads`] checks that the numbers inside
//! are physically plausible.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod command;
pub mod frame;
pub mod payloads;
pub mod rx;

pub use command::{Action, Command, Response, ResponseStatus, Target};
pub use frame::{Frame, FrameError, FrameParser, MAX_FRAME_SIZE, MAX_PAYLOAD_SIZE};
pub use payloads::{
    AcPhaseReading, AlarmNotification, BatteryReading, DcCircuitReading, FrameType,
    OperationMode, Payload, PayloadError, PowerModuleReading, SystemStatus, WireText,
};
pub use rx::{RxConsumer, RxProducer, RxQueue};
