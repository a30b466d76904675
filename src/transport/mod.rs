//! Transport layer: TCP connection establishment.

pub mod tcp;

pub use tcp::connect;
