//! Wire format constants and byte-level operations.
//!
//! Both directions share one fixed layout:
//! ```text
//! ┌──────┬──────┬───────────┬────────┬──────────────┬──────┬──────┐
//! │ SOF  │ ADR  │ CMD / ACK │ LENGTH │ DATA         │ XOR  │ EOF  │
//! │ 0x68 │ 1 B  │ 1 byte    │ 1 byte │ LENGTH bytes │ 1 B  │ 0x16 │
//! └──────┴──────┴───────────┴────────┴──────────────┴──────┴──────┘
//! ```
//!
//! `LENGTH` counts only the `DATA` bytes. `XOR` is the exclusive-or fold
//! over `CMD..DATA` (or `ACK..DATA` on responses), computed over raw byte
//! values, never over their hex-text rendering.

use std::fmt;

/// Start-of-frame marker, fixed.
pub const SOF: u8 = 0x68;

/// End-of-frame marker, fixed.
pub const EOF: u8 = 0x16;

/// Device address byte. Single-device deployment, always 0x01.
pub const DEVICE_ADDRESS: u8 = 0x01;

/// Fixed overhead around DATA: SOF + ADR + CMD/ACK + LENGTH + XOR + EOF.
pub const FIXED_FIELDS: usize = 6;

/// Total length of a state-query response (LENGTH == 2).
pub const STATE_RESPONSE_LEN: usize = 8;

/// Byte offsets of the fixed leading fields.
pub mod offset {
    /// Start-of-frame marker.
    pub const SOF: usize = 0;
    /// Device address.
    pub const ADR: usize = 1;
    /// Command opcode (outbound) or ACK result (inbound).
    pub const CMD: usize = 2;
    /// DATA byte count.
    pub const LENGTH: usize = 3;
    /// First DATA byte; XOR and EOF follow at `DATA + length`.
    pub const DATA: usize = 4;
}

/// Command opcodes the computer sends to the device.
pub mod opcode {
    /// Drive a relay to its released ("off") position.
    pub const OPEN: u8 = 0xa3;
    /// Drive a relay to its energized ("on") position.
    ///
    /// The device vocabulary is inverted relative to the switch metaphor:
    /// "close" closes the circuit, so the relay turns on.
    pub const CLOSE: u8 = 0xa2;
    /// Query the current state of both relays.
    pub const READ_STATE: u8 = 0xa7;
}

/// Device execution result carried in the ACK byte of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckCode {
    /// Command executed correctly.
    Success,
    /// LENGTH field did not match the received DATA.
    LengthError,
    /// XOR validation failed on the device.
    ChecksumError,
    /// Unrecognized command opcode.
    InvalidCommand,
    /// Parameter bytes beyond the declared LENGTH.
    ParameterError,
}

impl AckCode {
    /// Decode an ACK byte. Returns `None` for unrecognized values, which
    /// callers must treat as a decode failure rather than ignore.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(AckCode::Success),
            0x80 => Some(AckCode::LengthError),
            0x81 => Some(AckCode::ChecksumError),
            0x82 => Some(AckCode::InvalidCommand),
            0x83 => Some(AckCode::ParameterError),
            _ => None,
        }
    }

    /// The wire byte for this code.
    pub fn as_byte(self) -> u8 {
        match self {
            AckCode::Success => 0x00,
            AckCode::LengthError => 0x80,
            AckCode::ChecksumError => 0x81,
            AckCode::InvalidCommand => 0x82,
            AckCode::ParameterError => 0x83,
        }
    }
}

impl fmt::Display for AckCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let desc = match self {
            AckCode::Success => "success",
            AckCode::LengthError => "LENGTH error",
            AckCode::ChecksumError => "XOR validation error",
            AckCode::InvalidCommand => "invalid command",
            AckCode::ParameterError => "parameter beyond LENGTH",
        };
        write!(f, "{} ({:#04x})", desc, self.as_byte())
    }
}

/// XOR fold over the command/ACK byte followed by each payload byte,
/// seeded at 0x00. An empty payload yields the command byte alone.
#[inline]
pub fn xor_checksum(command: u8, payload: &[u8]) -> u8 {
    payload.iter().fold(command, |acc, b| acc ^ b)
}
