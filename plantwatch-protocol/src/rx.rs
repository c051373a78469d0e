//! Receive byte queue between the UART side and the frame consumer
//!
//! The UART receive path pushes raw bytes into a single-producer
//! single-consumer ring; the supervisor drains it through a [`FrameParser`].
//! Buffer, indices and readiness live in one lock-free unit, so a frame can
//! never be torn between the two sides.

use heapless::spsc::{Consumer, Producer, Queue};

use crate::frame::{Frame, FrameError, FrameParser};

/// Fixed-capacity receive ring (holds `N - 1` bytes)
pub struct RxQueue<const N: usize> {
    queue: Queue<u8, N>,
}

impl<const N: usize> RxQueue<N> {
    pub const fn new() -> Self {
        Self {
            queue: Queue::new(),
        }
    }

    /// Split into the producer (receive side) and consumer (frame side)
    pub fn split(&mut self) -> (RxProducer<'_, N>, RxConsumer<'_, N>) {
        let (producer, consumer) = self.queue.split();
        (
            RxProducer {
                inner: producer,
                overflowed: 0,
            },
            RxConsumer { inner: consumer },
        )
    }
}

impl<const N: usize> Default for RxQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Receive side of the queue
pub struct RxProducer<'a, const N: usize> {
    inner: Producer<'a, u8, N>,
    overflowed: u32,
}

impl<'a, const N: usize> RxProducer<'a, N> {
    /// Push one byte; returns false (and counts it) when the ring is full
    pub fn push(&mut self, byte: u8) -> bool {
        if self.inner.enqueue(byte).is_err() {
            self.overflowed = self.overflowed.saturating_add(1);
            return false;
        }
        true
    }

    /// Push a burst of bytes, returning how many were accepted
    pub fn push_slice(&mut self, bytes: &[u8]) -> usize {
        let mut accepted = 0;
        for &byte in bytes {
            if self.push(byte) {
                accepted += 1;
            }
        }
        accepted
    }

    /// Bytes dropped because the consumer fell behind
    pub fn overflow_count(&self) -> u32 {
        self.overflowed
    }
}

/// Frame side of the queue
pub struct RxConsumer<'a, const N: usize> {
    inner: Consumer<'a, u8, N>,
}

impl<'a, const N: usize> RxConsumer<'a, N> {
    /// Bytes waiting to be parsed
    pub fn pending(&self) -> usize {
        self.inner.len()
    }

    /// Drain bytes into `parser` until a frame or an error comes out
    ///
    /// Returns `Ok(None)` once the queue is empty with no complete frame.
    /// Bytes after a returned frame stay queued for the next call.
    pub fn poll_frame(&mut self, parser: &mut FrameParser) -> Result<Option<Frame>, FrameError> {
        // Bytes kept back from an earlier rejected frame come first
        if let Some(frame) = parser.poll()? {
            return Ok(Some(frame));
        }
        while let Some(byte) = self.inner.dequeue() {
            if let Some(frame) = parser.feed(byte)? {
                return Ok(Some(frame));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_bytes(msg_type: u8, payload: &[u8]) -> heapless::Vec<u8, 64> {
        Frame::new(msg_type, payload).unwrap().encode_to_vec().unwrap()
    }

    #[test]
    fn test_frame_through_queue() {
        let mut queue: RxQueue<128> = RxQueue::new();
        let (mut producer, mut consumer) = queue.split();
        let mut parser = FrameParser::new();

        let bytes = frame_bytes(0x07, &[1, 2, 0, 2, 0]);
        assert_eq!(producer.push_slice(&bytes), bytes.len());

        let frame = consumer.poll_frame(&mut parser).unwrap().unwrap();
        assert_eq!(frame.msg_type, 0x07);
        assert_eq!(frame.payload.as_slice(), &[1, 2, 0, 2, 0]);
        assert_eq!(consumer.pending(), 0);
    }

    #[test]
    fn test_partial_frame_waits() {
        let mut queue: RxQueue<128> = RxQueue::new();
        let (mut producer, mut consumer) = queue.split();
        let mut parser = FrameParser::new();

        let bytes = frame_bytes(0x06, &[0; 12]);
        producer.push_slice(&bytes[..7]);
        assert_eq!(consumer.poll_frame(&mut parser), Ok(None));

        producer.push_slice(&bytes[7..]);
        assert!(consumer.poll_frame(&mut parser).unwrap().is_some());
    }

    #[test]
    fn test_second_frame_stays_queued() {
        let mut queue: RxQueue<128> = RxQueue::new();
        let (mut producer, mut consumer) = queue.split();
        let mut parser = FrameParser::new();

        let first = frame_bytes(0x01, &[1]);
        let second = frame_bytes(0x02, &[2]);
        producer.push_slice(&first);
        producer.push_slice(&second);

        let frame = consumer.poll_frame(&mut parser).unwrap().unwrap();
        assert_eq!(frame.msg_type, 0x01);
        assert_eq!(consumer.pending(), second.len());

        let frame = consumer.poll_frame(&mut parser).unwrap().unwrap();
        assert_eq!(frame.msg_type, 0x02);
    }

    #[test]
    fn test_overflow_counted() {
        let mut queue: RxQueue<8> = RxQueue::new();
        let (mut producer, _consumer) = queue.split();

        // Ring holds N - 1 bytes
        assert_eq!(producer.push_slice(&[0u8; 10]), 7);
        assert_eq!(producer.overflow_count(), 3);
    }

    #[test]
    fn test_corrupt_frame_reported_then_recovers() {
        let mut queue: RxQueue<128> = RxQueue::new();
        let (mut producer, mut consumer) = queue.split();
        let mut parser = FrameParser::new();

        let mut bad = frame_bytes(0x01, &[1, 2, 3]);
        let last = bad.len() - 1;
        bad[last] ^= 0xFF;
        producer.push_slice(&bad);
        producer.push_slice(&frame_bytes(0x01, &[4]));

        assert_eq!(
            consumer.poll_frame(&mut parser),
            Err(FrameError::ChecksumMismatch)
        );
        let frame = consumer.poll_frame(&mut parser).unwrap().unwrap();
        assert_eq!(frame.payload.as_slice(), &[4]);
    }

    #[test]
    fn test_retry_after_torn_frame_delivered() {
        let mut queue: RxQueue<128> = RxQueue::new();
        let (mut producer, mut consumer) = queue.split();
        let mut parser = FrameParser::new();

        let bytes = frame_bytes(0x07, &[1, 2, 0, 2, 0]);
        producer.push_slice(&bytes[..6]);
        producer.push_slice(&bytes);

        assert_eq!(
            consumer.poll_frame(&mut parser),
            Err(FrameError::ChecksumMismatch)
        );
        let frame = consumer.poll_frame(&mut parser).unwrap().unwrap();
        assert_eq!(frame.msg_type, 0x07);
        assert_eq!(consumer.poll_frame(&mut parser), Ok(None));
    }
}
