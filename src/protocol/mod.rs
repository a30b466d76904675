//! Frame codec: pure, per-call logic with no I/O.
//!
//! - [`wire_format`]: layout constants, opcodes, ACK codes, XOR fold
//! - [`frame`]: command assembly and response parsing
//! - [`frame_buffer`]: reassembly of frames from unaligned TCP reads

pub mod frame;
pub mod frame_buffer;
pub mod wire_format;

pub use frame::{CommandFrame, ResponseFrame};
pub use frame_buffer::FrameBuffer;
pub use wire_format::{
    offset, opcode, xor_checksum, AckCode, DEVICE_ADDRESS, EOF, FIXED_FIELDS, SOF,
    STATE_RESPONSE_LEN,
};
