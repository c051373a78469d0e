//! Frame encoding and decoding for the supervisory serial link.
//!
//! Frame format:
//! - HEADER (2 bytes): 0xAA 0x55 synchronization bytes
//! - TYPE (1 byte): payload type tag
//! - LENGTH (1 byte): payload length (0-59)
//! - PAYLOAD (0-59 bytes): type-specific data
//! - CHECKSUM (1 byte): XOR of HEADER, TYPE, LENGTH and all PAYLOAD bytes

use heapless::Vec;

/// First header byte
pub const HEADER_HIGH: u8 = 0xAA;

/// Second header byte
pub const HEADER_LOW: u8 = 0x55;

/// Maximum complete frame size on the wire
pub const MAX_FRAME_SIZE: usize = 64;

/// Bytes that are not payload (HEADER + TYPE + LENGTH + CHECKSUM)
pub const FRAME_OVERHEAD: usize = 5;

/// Maximum payload size in bytes
pub const MAX_PAYLOAD_SIZE: usize = MAX_FRAME_SIZE - FRAME_OVERHEAD;

/// Errors that can occur during frame encoding or decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Payload exceeds maximum allowed size
    PayloadTooLarge,
    /// Fewer bytes than the smallest possible frame
    TooShort,
    /// Magic header bytes do not match
    BadHeader,
    /// Declared length exceeds capacity or the bytes available
    LengthOverflow,
    /// Recomputed checksum disagrees with the trailer
    ChecksumMismatch,
    /// Buffer too small for encoding
    BufferTooSmall,
}

/// Running XOR over a byte slice
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |acc, &b| acc ^ b)
}

/// A parsed or constructed frame
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame {
    /// Payload type tag
    pub msg_type: u8,
    /// Payload data
    pub payload: Vec<u8, MAX_PAYLOAD_SIZE>,
}

impl Frame {
    /// Create a new frame with the given type tag and payload
    pub fn new(msg_type: u8, payload: &[u8]) -> Result<Self, FrameError> {
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(FrameError::PayloadTooLarge);
        }

        let mut payload_vec = Vec::new();
        payload_vec
            .extend_from_slice(payload)
            .map_err(|_| FrameError::PayloadTooLarge)?;

        Ok(Self {
            msg_type,
            payload: payload_vec,
        })
    }

    /// Create a frame with no payload
    pub fn empty(msg_type: u8) -> Self {
        Self {
            msg_type,
            payload: Vec::new(),
        }
    }

    /// Number of bytes this frame occupies on the wire
    pub fn wire_len(&self) -> usize {
        FRAME_OVERHEAD + self.payload.len()
    }

    /// Encode this frame into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, FrameError> {
        let frame_len = self.wire_len();
        if buffer.len() < frame_len {
            return Err(FrameError::BufferTooSmall);
        }

        let body_len = frame_len - 1;
        buffer[0] = HEADER_HIGH;
        buffer[1] = HEADER_LOW;
        buffer[2] = self.msg_type;
        buffer[3] = self.payload.len() as u8;
        buffer[4..body_len].copy_from_slice(&self.payload);
        buffer[body_len] = checksum(&buffer[..body_len]);

        Ok(frame_len)
    }

    /// Encode this frame into a heapless Vec
    pub fn encode_to_vec(&self) -> Result<Vec<u8, MAX_FRAME_SIZE>, FrameError> {
        let mut buffer = [0u8; MAX_FRAME_SIZE];
        let len = self.encode(&mut buffer)?;
        let mut vec = Vec::new();
        vec.extend_from_slice(&buffer[..len])
            .map_err(|_| FrameError::BufferTooSmall)?;
        Ok(vec)
    }

    /// Decode one frame from the start of `bytes`
    ///
    /// Bytes after the checksum trailer are ignored. The checksum is verified
    /// before the header so that any single corrupted bit inside the frame
    /// surfaces as `ChecksumMismatch`.
    pub fn decode(bytes: &[u8]) -> Result<Self, FrameError> {
        if bytes.len() < FRAME_OVERHEAD {
            return Err(FrameError::TooShort);
        }

        let length = bytes[3] as usize;
        if length > MAX_PAYLOAD_SIZE || FRAME_OVERHEAD + length > bytes.len() {
            return Err(FrameError::LengthOverflow);
        }

        let body_len = 4 + length;
        if checksum(&bytes[..body_len]) != bytes[body_len] {
            return Err(FrameError::ChecksumMismatch);
        }

        if bytes[0] != HEADER_HIGH || bytes[1] != HEADER_LOW {
            return Err(FrameError::BadHeader);
        }

        Self::new(bytes[2], &bytes[4..body_len])
    }
}

/// Streaming parser for frames arriving over a byte link
///
/// Holds the raw bytes of the frame being assembled, starting at its header.
/// When a candidate is rejected, only its first byte is dropped and the rest
/// is scanned again, so a frame that began inside a torn one is still found.
#[derive(Debug, Clone)]
pub struct FrameParser {
    raw: Vec<u8, MAX_FRAME_SIZE>,
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameParser {
    /// Create a new frame parser
    pub const fn new() -> Self {
        Self { raw: Vec::new() }
    }

    /// Reset the parser state
    pub fn reset(&mut self) {
        self.raw.clear();
    }

    /// True when no partial frame is buffered
    pub fn is_idle(&self) -> bool {
        self.raw.is_empty()
    }

    /// Feed a single byte to the parser
    ///
    /// Returns `Ok(Some(frame))` when a complete valid frame is parsed,
    /// `Ok(None)` when more bytes are needed, or `Err` on parse error.
    /// Bytes left over from a rejected candidate stay buffered; see [`poll`].
    ///
    /// [`poll`]: FrameParser::poll
    pub fn feed(&mut self, byte: u8) -> Result<Option<Frame>, FrameError> {
        if self.raw.is_empty() && byte != HEADER_HIGH {
            return Ok(None);
        }
        // poll() never leaves a full buffer behind
        let _ = self.raw.push(byte);
        self.poll()
    }

    /// Look for the next frame or error in the buffered bytes
    ///
    /// Reports at most one event. Call again until it returns `Ok(None)` to
    /// flush frames that were buffered behind a rejected candidate.
    pub fn poll(&mut self) -> Result<Option<Frame>, FrameError> {
        loop {
            self.skip_to_header();
            if self.raw.len() < 2 {
                return Ok(None);
            }
            if self.raw[1] != HEADER_LOW {
                self.discard(1);
                continue;
            }
            if self.raw.len() < 4 {
                return Ok(None);
            }

            let length = self.raw[3] as usize;
            if length > MAX_PAYLOAD_SIZE {
                self.reject();
                return Err(FrameError::LengthOverflow);
            }
            let wire_len = length + FRAME_OVERHEAD;
            if self.raw.len() < wire_len {
                return Ok(None);
            }

            let body_len = wire_len - 1;
            if checksum(&self.raw[..body_len]) != self.raw[body_len] {
                self.reject();
                return Err(FrameError::ChecksumMismatch);
            }
            let frame = Frame::new(self.raw[2], &self.raw[4..body_len]);
            self.discard(wire_len);
            return frame.map(Some);
        }
    }

    /// Drop the first byte of a bad candidate and hunt for the next header
    fn reject(&mut self) {
        self.discard(1);
        self.skip_to_header();
    }

    fn skip_to_header(&mut self) {
        match self.raw.iter().position(|&b| b == HEADER_HIGH) {
            Some(start) => self.discard(start),
            None => self.raw.clear(),
        }
    }

    fn discard(&mut self, count: usize) {
        let len = self.raw.len();
        let count = count.min(len);
        self.raw.copy_within(count.., 0);
        self.raw.truncate(len - count);
    }

    /// Feed multiple bytes to the parser
    ///
    /// Returns the first complete frame found, if any, together with the
    /// number of bytes consumed. Bytes after a complete frame are not consumed.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> (usize, Result<Option<Frame>, FrameError>) {
        for (i, &byte) in bytes.iter().enumerate() {
            match self.feed(byte) {
                Ok(None) => {}
                other => return (i + 1, other),
            }
        }
        (bytes.len(), Ok(None))
    }
}
