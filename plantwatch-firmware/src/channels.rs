//! Inter-task communication channels
//!
//! Static channels and signals shared between the Embassy tasks.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;

use plantwatch_core::alarm::Indication;
use plantwatch_protocol::Frame;

/// Outbound frames queued for the host UART
const TX_CHANNEL_SIZE: usize = 16;

/// Frames waiting for the serial TX task
pub static TX_FRAMES: Channel<CriticalSectionRawMutex, Frame, TX_CHANNEL_SIZE> = Channel::new();

/// Bytes are waiting in the receive queue
pub static RX_READY: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Latest front-panel indication (updated by the supervisor)
pub static INDICATION: Signal<CriticalSectionRawMutex, Indication> = Signal::new();
