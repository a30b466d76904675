//! # relaywire
//!
//! Async TCP client driver for two-channel relay boards speaking the
//! fixed-layout `0x68 .. 0x16` framed command/response protocol.
//!
//! ## Architecture
//!
//! - **Frame codec** ([`protocol`]): pure command assembly, response
//!   parsing, XOR checksumming, and frame reassembly. No I/O.
//! - **Device session** ([`session`]): owns the TCP connection, sends
//!   encoded frames, routes inbound bytes through the codec, and publishes
//!   decoded relay state to subscribers.
//!
//! ## Example
//!
//! ```ignore
//! use relaywire::{Channel, RelaySession, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() -> relaywire::Result<()> {
//!     let session = RelaySession::connect(SessionConfig::new("10.0.0.2", 8899)).await?;
//!     let mut events = session.subscribe_state();
//!
//!     session.close(Channel::One).await?; // energize relay 1
//!     session.query_state().await?;
//!
//!     let event = events.recv().await.expect("event stream open");
//!     println!("relay {} -> {}", event.channel, event.state);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod protocol;
pub mod session;
pub mod state;
pub mod transport;

pub use config::SessionConfig;
pub use error::{RelayError, Result};
pub use session::{ConnectionState, RelaySession};
pub use state::{Channel, RelayState, StateEvent};
