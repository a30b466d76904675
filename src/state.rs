//! Relay channels, per-channel state, and the status-code decode table.
//!
//! The device vocabulary is inverted relative to the switch metaphor and is
//! preserved as-is: the "close" command (`0xa2`) closes the circuit, so the
//! relay reads **on**; "open" (`0xa3`) breaks it, so the relay reads **off**.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{RelayError, Result};

/// One of the two independently controllable relay outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    /// Relay output 1, wire selector `0x01`.
    One,
    /// Relay output 2, wire selector `0x02`.
    Two,
}

impl Channel {
    /// The DATA selector byte for this channel.
    #[inline]
    pub fn selector(self) -> u8 {
        match self {
            Channel::One => 0x01,
            Channel::Two => 0x02,
        }
    }

    /// Zero-based index, for per-channel storage.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Channel::One => 0,
            Channel::Two => 1,
        }
    }

    /// Both channels in wire order.
    pub const ALL: [Channel; 2] = [Channel::One, Channel::Two];
}

impl TryFrom<u8> for Channel {
    type Error = RelayError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(Channel::One),
            2 => Ok(Channel::Two),
            other => Err(RelayError::InvalidChannel(other)),
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.selector())
    }
}

/// Logical state of one relay output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelayState {
    /// Circuit closed, output energized.
    On,
    /// Circuit open, output released.
    Off,
    /// Not yet observed; initial state of every session.
    Unknown,
}

impl fmt::Display for RelayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RelayState::On => "on",
            RelayState::Off => "off",
            RelayState::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// A channel-state-changed notification published to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateEvent {
    /// Which output changed.
    pub channel: Channel,
    /// Its new state.
    pub state: RelayState,
}

/// Decode the 2-byte status code of a state-query response into
/// (channel 1, channel 2) states.
///
/// Exactly four combinations exist; anything else fails with
/// `UnknownStatus`.
pub fn decode_status(data: &[u8]) -> Result<(RelayState, RelayState)> {
    let code: [u8; 2] = data.try_into().map_err(|_| {
        RelayError::MalformedFrame(format!("status payload must be 2 bytes, got {}", data.len()))
    })?;

    match code {
        [0xf3, 0x0f] => Ok((RelayState::Off, RelayState::Off)),
        [0xf3, 0x0e] => Ok((RelayState::On, RelayState::Off)),
        [0xf3, 0x0d] => Ok((RelayState::Off, RelayState::On)),
        [0xf3, 0x0c] => Ok((RelayState::On, RelayState::On)),
        [a, b] => Err(RelayError::UnknownStatus(a, b)),
    }
}
