//! Device session: connection lifecycle, command sending, and the inbound
//! decode path.
//!
//! The session composes the pure frame codec with one TCP connection:
//! 1. Connect (optionally binding a pinned local endpoint)
//! 2. Split the stream; spawn the read loop on the read half
//! 3. Commands write to the write half and apply an optimistic local update
//! 4. The read loop reassembles frames and republishes decoded relay state
//!
//! Commands are fire-and-forget: `query_state` returns as soon as the write
//! completes, and the decoded answer arrives later on the state-event
//! stream. No reconnection logic lives here; on error or close the session
//! goes `Disconnected` and stays there.
//!
//! # Example
//!
//! ```ignore
//! use relaywire::{Channel, RelaySession, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() -> relaywire::Result<()> {
//!     let session = RelaySession::connect(SessionConfig::new("10.0.0.2", 8899)).await?;
//!     let mut events = session.subscribe_state();
//!
//!     session.close(Channel::One).await?; // relay 1 on
//!     session.query_state().await?;
//!
//!     while let Ok(event) = events.recv().await {
//!         println!("relay {} is {}", event.channel, event.state);
//!     }
//!     Ok(())
//! }
//! ```

use std::sync::{Arc, Mutex as StdMutex};

use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{broadcast, oneshot, Mutex};
use tokio::task::JoinHandle;

use crate::config::SessionConfig;
use crate::error::{RelayError, Result};
use crate::protocol::{opcode, AckCode, CommandFrame, FrameBuffer, ResponseFrame, STATE_RESPONSE_LEN};
use crate::state::{decode_status, Channel, RelayState, StateEvent};
use crate::transport;

/// Capacity of the broadcast streams. Events are rare (one per command or
/// per state response), so a lagging subscriber has to be very far behind
/// to lose any.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Read buffer size; frames are at most 261 bytes.
const READ_BUFFER_SIZE: usize = 1024;

/// Connection lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection, or the connection was lost.
    Disconnected,
    /// TCP connect in flight.
    Connecting,
    /// Connected; commands are accepted.
    Connected,
}

/// State shared between the session handle and its read loop.
#[derive(Debug)]
struct Shared {
    connection: StdMutex<ConnectionState>,
    /// Per-channel state, updated by the inbound decode path and by the
    /// optimistic update on outbound commands.
    channels: StdMutex<[RelayState; 2]>,
}

impl Shared {
    fn new() -> Self {
        Self {
            connection: StdMutex::new(ConnectionState::Disconnected),
            channels: StdMutex::new([RelayState::Unknown; 2]),
        }
    }

    fn set_connection(&self, state: ConnectionState) {
        *self.connection.lock().expect("connection lock poisoned") = state;
    }

    fn connection(&self) -> ConnectionState {
        *self.connection.lock().expect("connection lock poisoned")
    }

    fn set_channel(&self, channel: Channel, state: RelayState) {
        self.channels.lock().expect("channel lock poisoned")[channel.index()] = state;
    }

    fn channel(&self, channel: Channel) -> RelayState {
        self.channels.lock().expect("channel lock poisoned")[channel.index()]
    }
}

/// An active session with one relay device.
///
/// Cheap to share behind an `Arc`; all operations take `&self`.
#[derive(Debug)]
pub struct RelaySession {
    shared: Arc<Shared>,
    writer: Mutex<OwnedWriteHalf>,
    state_tx: broadcast::Sender<StateEvent>,
    raw_tx: broadcast::Sender<Bytes>,
    shutdown_rx: oneshot::Receiver<()>,
    read_task: JoinHandle<()>,
}

impl RelaySession {
    /// Connect to the device and start the inbound read loop.
    pub async fn connect(config: SessionConfig) -> Result<Self> {
        let shared = Arc::new(Shared::new());

        shared.set_connection(ConnectionState::Connecting);
        let stream = match transport::connect(&config).await {
            Ok(stream) => stream,
            Err(e) => {
                shared.set_connection(ConnectionState::Disconnected);
                return Err(e);
            }
        };
        shared.set_connection(ConnectionState::Connected);

        let (reader, writer) = stream.into_split();
        let (state_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (raw_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let read_task = {
            let shared = shared.clone();
            let state_tx = state_tx.clone();
            let raw_tx = raw_tx.clone();
            tokio::spawn(async move {
                read_loop(reader, &shared, &state_tx, &raw_tx).await;
                shared.set_connection(ConnectionState::Disconnected);
                let _ = shutdown_tx.send(());
            })
        };

        Ok(Self {
            shared,
            writer: Mutex::new(writer),
            state_tx,
            raw_tx,
            shutdown_rx,
            read_task,
        })
    }

    /// Drive a relay to its released position (device vocabulary: "open"
    /// breaks the circuit, so the relay reads **off**).
    ///
    /// Optimistically updates local state and emits the event on send,
    /// without waiting for device acknowledgment.
    pub async fn open(&self, channel: Channel) -> Result<()> {
        self.send_switch(channel, opcode::OPEN, RelayState::Off).await
    }

    /// Drive a relay to its energized position ("close" closes the circuit,
    /// so the relay reads **on**). Optimistic update as with [`open`].
    ///
    /// [`open`]: RelaySession::open
    pub async fn close(&self, channel: Channel) -> Result<()> {
        self.send_switch(channel, opcode::CLOSE, RelayState::On).await
    }

    /// Ask the device for the state of both relays.
    ///
    /// Returns once the write completes. The answer arrives asynchronously:
    /// the read loop decodes it and publishes one [`StateEvent`] per
    /// channel. Correlation and timeouts are the caller's concern.
    pub async fn query_state(&self) -> Result<()> {
        self.ensure_connected()?;
        let frame = CommandFrame::build(opcode::READ_STATE, &[0x00]);
        self.write(frame.as_bytes()).await
    }

    /// Subscribe to channel-state-changed events. Multiple independent
    /// subscribers are permitted.
    pub fn subscribe_state(&self) -> broadcast::Receiver<StateEvent> {
        self.state_tx.subscribe()
    }

    /// Subscribe to raw inbound byte chunks, exactly as read off the
    /// socket and before any reassembly or decoding.
    pub fn subscribe_raw(&self) -> broadcast::Receiver<Bytes> {
        self.raw_tx.subscribe()
    }

    /// Last known state of a channel (`Unknown` until first observed).
    pub fn channel_state(&self, channel: Channel) -> RelayState {
        self.shared.channel(channel)
    }

    /// Current connection lifecycle state.
    pub fn connection_state(&self) -> ConnectionState {
        self.shared.connection()
    }

    /// Resolve when the read loop exits (device close or read error).
    /// Consumes the session.
    pub async fn wait_for_disconnect(mut self) {
        let _ = (&mut self.shutdown_rx).await;
    }

    async fn send_switch(&self, channel: Channel, command: u8, assumed: RelayState) -> Result<()> {
        self.ensure_connected()?;
        let frame = CommandFrame::build(command, &[channel.selector()]);
        self.write(frame.as_bytes()).await?;

        // Optimistic update, applied on send regardless of acknowledgment.
        self.shared.set_channel(channel, assumed);
        let _ = self.state_tx.send(StateEvent { channel, state: assumed });

        tracing::debug!(%channel, state = %assumed, "command sent");
        Ok(())
    }

    async fn write(&self, bytes: &[u8]) -> Result<()> {
        let mut writer = self.writer.lock().await;
        writer.write_all(bytes).await?;
        writer.flush().await?;
        Ok(())
    }

    fn ensure_connected(&self) -> Result<()> {
        match self.shared.connection() {
            ConnectionState::Connected => Ok(()),
            _ => Err(RelayError::NotConnected),
        }
    }
}

impl Drop for RelaySession {
    fn drop(&mut self) {
        // An abandoned session must not keep the read half of the socket
        // alive until the device closes; the write half drops with `self`.
        self.read_task.abort();
    }
}

/// Inbound path: read chunks, republish them raw, reassemble frames, and
/// decode state-query responses. Chunks are processed in arrival order,
/// one at a time.
async fn read_loop(
    mut reader: OwnedReadHalf,
    shared: &Shared,
    state_tx: &broadcast::Sender<StateEvent>,
    raw_tx: &broadcast::Sender<Bytes>,
) {
    let mut frames = FrameBuffer::new();
    let mut buf = vec![0u8; READ_BUFFER_SIZE];

    loop {
        let n = match reader.read(&mut buf).await {
            Ok(0) => {
                tracing::debug!("device closed the connection");
                return;
            }
            Ok(n) => n,
            Err(e) => {
                tracing::error!(error = %e, "read loop terminated");
                return;
            }
        };

        let chunk = &buf[..n];
        let _ = raw_tx.send(Bytes::copy_from_slice(chunk));

        for frame in frames.push(chunk) {
            handle_frame(&frame, shared, state_tx);
        }
    }
}

/// Decode one reassembled frame. Only an 8-byte frame with a success ACK is
/// a state-query response; everything else is logged and dropped. A single
/// bad frame never corrupts channel state or ends the session.
fn handle_frame(bytes: &Bytes, shared: &Shared, state_tx: &broadcast::Sender<StateEvent>) {
    let response = match ResponseFrame::parse(bytes) {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(error = %e, "dropping undecodable frame");
            return;
        }
    };

    if response.frame_len != STATE_RESPONSE_LEN
        || !matches!(response.ack_code(), Ok(AckCode::Success))
    {
        tracing::debug!(
            ack = response.ack,
            len = response.frame_len,
            "ignoring frame: not a state-query response"
        );
        return;
    }

    match decode_status(&response.data) {
        Ok((ch1, ch2)) => {
            for (channel, state) in [(Channel::One, ch1), (Channel::Two, ch2)] {
                shared.set_channel(channel, state);
                let _ = state_tx.send(StateEvent { channel, state });
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "state response carried an unknown status code");
        }
    }
}
