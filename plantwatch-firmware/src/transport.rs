//! Frame sink backed by the TX channel

use plantwatch_core::traits::{FrameSink, SinkError};
use plantwatch_protocol::Frame;

use crate::channels::TX_FRAMES;

/// Queues frames for the serial TX task without blocking
///
/// A full channel drops the frame; the registry counts the failure and
/// re-sends state on the next `Alarms/Get`.
pub struct ChannelSink;

impl FrameSink for ChannelSink {
    fn send(&mut self, frame: &Frame) -> Result<(), SinkError> {
        TX_FRAMES
            .try_send(frame.clone())
            .map_err(|_| SinkError::Full)
    }
}
