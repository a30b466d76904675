//! Error types for relaywire.

use thiserror::Error;

use crate::protocol::AckCode;

/// Main error type for all relaywire operations.
#[derive(Debug, Error)]
pub enum RelayError {
    /// I/O error during connect or write.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Operation requires an established connection.
    #[error("session is not connected")]
    NotConnected,

    /// Channel selector outside the two supported outputs.
    #[error("invalid relay channel: {0} (expected 1 or 2)")]
    InvalidChannel(u8),

    /// Inbound buffer smaller than the frame it claims to hold.
    #[error("frame too short: need {needed} bytes, got {got}")]
    FrameTooShort { needed: usize, got: usize },

    /// Structural violation (bad SOF/EOF marker, unrecognized ACK byte).
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// Recomputed XOR fold disagrees with the frame's checksum field.
    #[error("checksum mismatch: frame carries {expected:#04x}, computed {computed:#04x}")]
    ChecksumMismatch { expected: u8, computed: u8 },

    /// State-query payload outside the four known status codes.
    #[error("unknown status code: {0:02x}{1:02x}")]
    UnknownStatus(u8, u8),

    /// Device reported a protocol-level failure in its ACK byte.
    #[error("device reported error: {0}")]
    DeviceProtocol(AckCode),
}

/// Result type alias using RelayError.
pub type Result<T> = std::result::Result<T, RelayError>;
