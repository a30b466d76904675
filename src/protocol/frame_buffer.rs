//! Frame buffer for accumulating partial reads.
//!
//! TCP delivery is not aligned to frame boundaries: one read may carry half
//! a frame, or several frames back to back. `FrameBuffer` accumulates bytes
//! in a `BytesMut` and carves out complete frames by tracking SOF, then
//! LENGTH, then EOF.
//!
//! Resynchronization: bytes before a SOF marker are discarded, and a SOF
//! whose frame does not end in EOF at the expected offset is treated as a
//! stray data byte — the buffer drops one byte and rescans. A corrupt chunk
//! therefore costs at most the bytes it occupies, never the session.
//!
//! # Example
//!
//! ```
//! use relaywire::protocol::FrameBuffer;
//!
//! let mut buffer = FrameBuffer::new();
//! let frames = buffer.push(&[0x68, 0x01, 0x00, 0x02, 0xf3, 0x0f, 0xfc, 0x16]);
//! assert_eq!(frames.len(), 1);
//! ```

use bytes::{Bytes, BytesMut};

use super::wire_format::{offset, EOF, FIXED_FIELDS, SOF};

/// Initial capacity; frames are at most 261 bytes so this never grows.
const INITIAL_CAPACITY: usize = 1024;

/// Buffer for accumulating inbound bytes and extracting complete frames.
#[derive(Debug)]
pub struct FrameBuffer {
    buffer: BytesMut,
}

impl FrameBuffer {
    /// Create an empty frame buffer.
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(INITIAL_CAPACITY),
        }
    }

    /// Push a chunk and extract every complete frame it completes.
    ///
    /// Returned frames are exact byte spans (`SOF..EOF` inclusive) in
    /// arrival order. Partial data stays buffered for the next push.
    pub fn push(&mut self, data: &[u8]) -> Vec<Bytes> {
        self.buffer.extend_from_slice(data);

        let mut frames = Vec::new();
        while let Some(frame) = self.try_extract_one() {
            frames.push(frame);
        }
        frames
    }

    /// Try to carve one complete frame off the front of the buffer.
    fn try_extract_one(&mut self) -> Option<Bytes> {
        loop {
            self.discard_to_sof();

            if self.buffer.len() <= offset::LENGTH {
                return None;
            }

            let frame_len = FIXED_FIELDS + self.buffer[offset::LENGTH] as usize;
            if self.buffer.len() < frame_len {
                return None;
            }

            if self.buffer[frame_len - 1] != EOF {
                // Not a real frame boundary; drop the false SOF and rescan.
                tracing::debug!(frame_len, "EOF marker missing, resynchronizing");
                let _ = self.buffer.split_to(1);
                continue;
            }

            return Some(self.buffer.split_to(frame_len).freeze());
        }
    }

    /// Drop leading bytes until the buffer starts with SOF (or is empty).
    fn discard_to_sof(&mut self) {
        match self.buffer.iter().position(|&b| b == SOF) {
            Some(0) => {}
            Some(pos) => {
                tracing::debug!(dropped = pos, "discarding bytes before SOF");
                let _ = self.buffer.split_to(pos);
            }
            None => {
                if !self.buffer.is_empty() {
                    tracing::debug!(dropped = self.buffer.len(), "discarding bytes before SOF");
                    self.buffer.clear();
                }
            }
        }
    }

    /// Number of buffered bytes awaiting a complete frame.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Drop all buffered bytes.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}
