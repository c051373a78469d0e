//! Outbound frame transport

use plantwatch_protocol::Frame;

/// Errors from a frame sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SinkError {
    /// Transmit queue has no room for another frame
    Full,
    /// Link is down
    Disconnected,
}

/// Trait for anything that can carry frames to the supervisory host
///
/// Implementations must preserve frame order. A send either queues the whole
/// frame or reports an error; partial frames are never emitted.
pub trait FrameSink {
    fn send(&mut self, frame: &Frame) -> Result<(), SinkError>;
}
