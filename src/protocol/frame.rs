//! Command and response frame types.
//!
//! [`CommandFrame`] assembles outbound frames; [`ResponseFrame`] parses
//! inbound ones by explicit byte-offset arithmetic over the decoded byte
//! sequence. Checksum verification is a separate, explicit step — a parse
//! succeeding says nothing about the XOR field.
//!
//! # Example
//!
//! ```
//! use relaywire::protocol::{CommandFrame, opcode};
//!
//! let frame = CommandFrame::build(opcode::OPEN, &[0x01]);
//! assert_eq!(frame.as_bytes(), &[0x68, 0x01, 0xa3, 0x01, 0x01, 0xa2, 0x16]);
//! ```

use bytes::Bytes;

use super::wire_format::{
    offset, xor_checksum, AckCode, DEVICE_ADDRESS, EOF, FIXED_FIELDS, SOF,
};
use crate::error::{RelayError, Result};

/// An assembled outbound command frame. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFrame {
    bytes: Vec<u8>,
}

impl CommandFrame {
    /// Assemble a frame for the given opcode and payload.
    ///
    /// The address byte is fixed at [`DEVICE_ADDRESS`] and LENGTH is the
    /// payload's byte length. In practice the protocol only ever carries a
    /// one-byte payload.
    ///
    /// # Panics
    ///
    /// Panics if the payload exceeds 255 bytes (LENGTH is a single byte).
    pub fn build(command: u8, payload: &[u8]) -> Self {
        assert!(payload.len() <= u8::MAX as usize, "payload exceeds one-byte LENGTH");

        let mut bytes = Vec::with_capacity(FIXED_FIELDS + payload.len());
        bytes.push(SOF);
        bytes.push(DEVICE_ADDRESS);
        bytes.push(command);
        bytes.push(payload.len() as u8);
        bytes.extend_from_slice(payload);
        bytes.push(xor_checksum(command, payload));
        bytes.push(EOF);

        Self { bytes }
    }

    /// The complete frame bytes, ready for the socket.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Total frame length (fixed fields plus payload).
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// A command frame is never empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The command opcode byte.
    #[inline]
    pub fn command(&self) -> u8 {
        self.bytes[offset::CMD]
    }

    /// The XOR checksum byte.
    #[inline]
    pub fn checksum(&self) -> u8 {
        self.bytes[self.bytes.len() - 2]
    }
}

/// A parsed inbound response frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseFrame {
    /// Device address byte.
    pub address: u8,
    /// Raw ACK byte as received. Use [`ResponseFrame::ack_code`] to decode.
    pub ack: u8,
    /// DATA bytes (zero-copy slice of the input where possible).
    pub data: Bytes,
    /// XOR checksum field as received.
    pub checksum: u8,
    /// Total frame length on the wire.
    pub frame_len: usize,
}

impl ResponseFrame {
    /// Parse one complete frame from a byte sequence by fixed offsets.
    ///
    /// Fails with `FrameTooShort` when the buffer cannot hold the fixed
    /// fields or the DATA length it declares, and with `MalformedFrame`
    /// when the SOF/EOF markers are wrong. Does not verify the checksum.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < FIXED_FIELDS {
            return Err(RelayError::FrameTooShort {
                needed: FIXED_FIELDS,
                got: bytes.len(),
            });
        }

        let data_len = bytes[offset::LENGTH] as usize;
        let frame_len = FIXED_FIELDS + data_len;
        if bytes.len() < frame_len {
            return Err(RelayError::FrameTooShort {
                needed: frame_len,
                got: bytes.len(),
            });
        }

        if bytes[offset::SOF] != SOF {
            return Err(RelayError::MalformedFrame(format!(
                "bad SOF marker {:#04x}",
                bytes[offset::SOF]
            )));
        }
        if bytes[frame_len - 1] != EOF {
            return Err(RelayError::MalformedFrame(format!(
                "bad EOF marker {:#04x}",
                bytes[frame_len - 1]
            )));
        }

        Ok(Self {
            address: bytes[offset::ADR],
            ack: bytes[offset::CMD],
            data: Bytes::copy_from_slice(&bytes[offset::DATA..offset::DATA + data_len]),
            checksum: bytes[offset::DATA + data_len],
            frame_len,
        })
    }

    /// Decode the ACK byte. Unrecognized values are a decode failure.
    pub fn ack_code(&self) -> Result<AckCode> {
        AckCode::from_byte(self.ack).ok_or_else(|| {
            RelayError::MalformedFrame(format!("unrecognized ACK byte {:#04x}", self.ack))
        })
    }

    /// Map the device-reported result to `Ok` or `DeviceProtocol`.
    pub fn device_result(&self) -> Result<()> {
        match self.ack_code()? {
            AckCode::Success => Ok(()),
            code => Err(RelayError::DeviceProtocol(code)),
        }
    }

    /// Re-run the XOR fold over `ACK..DATA` and compare against the frame's
    /// checksum field. Explicit opt-in step, distinct from device-side ACK
    /// errors.
    pub fn verify_checksum(&self) -> Result<()> {
        let computed = xor_checksum(self.ack, &self.data);
        if computed != self.checksum {
            return Err(RelayError::ChecksumMismatch {
                expected: self.checksum,
                computed,
            });
        }
        Ok(())
    }
}
