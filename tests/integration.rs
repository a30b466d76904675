//! Integration tests against a loopback TCP listener standing in for the
//! relay device.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

use relaywire::{Channel, ConnectionState, RelaySession, RelayState, SessionConfig, StateEvent};

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// Bind a fake device and return it with a config pointing at it.
async fn fake_device() -> (TcpListener, SessionConfig) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, SessionConfig::new("127.0.0.1", port))
}

async fn read_exact(stream: &mut TcpStream, len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    timeout(RECV_TIMEOUT, stream.read_exact(&mut buf))
        .await
        .expect("device read timed out")
        .unwrap();
    buf
}

async fn next_event(rx: &mut tokio::sync::broadcast::Receiver<StateEvent>) -> StateEvent {
    timeout(RECV_TIMEOUT, rx.recv())
        .await
        .expect("event wait timed out")
        .unwrap()
}

#[tokio::test]
async fn test_open_sends_frame_and_emits_off_event() {
    let (listener, config) = fake_device().await;
    let session = RelaySession::connect(config).await.unwrap();
    let (mut device, _) = listener.accept().await.unwrap();
    let mut events = session.subscribe_state();

    session.open(Channel::One).await.unwrap();

    let wire = read_exact(&mut device, 7).await;
    assert_eq!(wire, [0x68, 0x01, 0xa3, 0x01, 0x01, 0xa2, 0x16]);

    let event = next_event(&mut events).await;
    assert_eq!(event, StateEvent { channel: Channel::One, state: RelayState::Off });
    assert_eq!(session.channel_state(Channel::One), RelayState::Off);
}

#[tokio::test]
async fn test_close_channel_two_sends_frame_and_emits_on_event() {
    let (listener, config) = fake_device().await;
    let session = RelaySession::connect(config).await.unwrap();
    let (mut device, _) = listener.accept().await.unwrap();
    let mut events = session.subscribe_state();

    session.close(Channel::Two).await.unwrap();

    let wire = read_exact(&mut device, 7).await;
    assert_eq!(wire, [0x68, 0x01, 0xa2, 0x01, 0x02, 0xa0, 0x16]);

    let event = next_event(&mut events).await;
    assert_eq!(event, StateEvent { channel: Channel::Two, state: RelayState::On });
    assert_eq!(session.channel_state(Channel::Two), RelayState::On);
}

#[tokio::test]
async fn test_open_twice_emits_two_identical_events() {
    let (listener, config) = fake_device().await;
    let session = RelaySession::connect(config).await.unwrap();
    let (mut device, _) = listener.accept().await.unwrap();
    let mut events = session.subscribe_state();

    session.open(Channel::One).await.unwrap();
    session.open(Channel::One).await.unwrap();

    let wire = read_exact(&mut device, 14).await;
    assert_eq!(wire[..7], wire[7..]);

    // No deduplication: two identical "off" notifications.
    let expected = StateEvent { channel: Channel::One, state: RelayState::Off };
    assert_eq!(next_event(&mut events).await, expected);
    assert_eq!(next_event(&mut events).await, expected);
}

#[tokio::test]
async fn test_query_state_roundtrip() {
    let (listener, config) = fake_device().await;
    let session = RelaySession::connect(config).await.unwrap();
    let (mut device, _) = listener.accept().await.unwrap();
    let mut events = session.subscribe_state();

    session.query_state().await.unwrap();

    let wire = read_exact(&mut device, 7).await;
    assert_eq!(wire, [0x68, 0x01, 0xa7, 0x01, 0x00, 0xa7, 0x16]);

    // Device reports both relays on: DATA = f30c, XOR = 00^f3^0c = ff.
    device
        .write_all(&[0x68, 0x01, 0x00, 0x02, 0xf3, 0x0c, 0xff, 0x16])
        .await
        .unwrap();

    assert_eq!(
        next_event(&mut events).await,
        StateEvent { channel: Channel::One, state: RelayState::On }
    );
    assert_eq!(
        next_event(&mut events).await,
        StateEvent { channel: Channel::Two, state: RelayState::On }
    );
    assert_eq!(session.channel_state(Channel::One), RelayState::On);
    assert_eq!(session.channel_state(Channel::Two), RelayState::On);
}

#[tokio::test]
async fn test_state_response_fragmented_across_writes() {
    let (listener, config) = fake_device().await;
    let session = RelaySession::connect(config).await.unwrap();
    let (mut device, _) = listener.accept().await.unwrap();
    let mut events = session.subscribe_state();

    let response = [0x68, 0x01, 0x00, 0x02, 0xf3, 0x0d, 0xfe, 0x16];
    device.write_all(&response[..3]).await.unwrap();
    device.flush().await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    device.write_all(&response[3..]).await.unwrap();

    assert_eq!(
        next_event(&mut events).await,
        StateEvent { channel: Channel::One, state: RelayState::Off }
    );
    assert_eq!(
        next_event(&mut events).await,
        StateEvent { channel: Channel::Two, state: RelayState::On }
    );
}

#[tokio::test]
async fn test_non_eight_byte_frame_emits_no_state_event() {
    let (listener, config) = fake_device().await;
    let session = RelaySession::connect(config).await.unwrap();
    let (mut device, _) = listener.accept().await.unwrap();
    let mut events = session.subscribe_state();
    let mut raw = session.subscribe_raw();

    // Valid 7-byte frame with success ACK: parses, but is not a
    // state-query response.
    device
        .write_all(&[0x68, 0x01, 0x00, 0x01, 0x00, 0x00, 0x16])
        .await
        .unwrap();

    // Raw stream still sees the chunk.
    let chunk = timeout(RECV_TIMEOUT, raw.recv()).await.unwrap().unwrap();
    assert_eq!(&chunk[..], &[0x68, 0x01, 0x00, 0x01, 0x00, 0x00, 0x16]);

    // No state event follows, and channel state is untouched.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(events.try_recv().is_err());
    assert_eq!(session.channel_state(Channel::One), RelayState::Unknown);
}

#[tokio::test]
async fn test_garbage_then_valid_frame_still_decodes() {
    let (listener, config) = fake_device().await;
    let session = RelaySession::connect(config).await.unwrap();
    let (mut device, _) = listener.accept().await.unwrap();
    let mut events = session.subscribe_state();

    let mut data = vec![0xde, 0xad];
    data.extend_from_slice(&[0x68, 0x01, 0x00, 0x02, 0xf3, 0x0e, 0xfd, 0x16]);
    device.write_all(&data).await.unwrap();

    assert_eq!(
        next_event(&mut events).await,
        StateEvent { channel: Channel::One, state: RelayState::On }
    );
    assert_eq!(
        next_event(&mut events).await,
        StateEvent { channel: Channel::Two, state: RelayState::Off }
    );
}

#[tokio::test]
async fn test_commands_fail_after_device_closes() {
    let (listener, config) = fake_device().await;
    let session = RelaySession::connect(config).await.unwrap();
    let (device, _) = listener.accept().await.unwrap();
    assert_eq!(session.connection_state(), ConnectionState::Connected);

    drop(device);

    // Wait for the read loop to observe the close.
    timeout(RECV_TIMEOUT, async {
        while session.connection_state() != ConnectionState::Disconnected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("session never observed the disconnect");

    let err = session.open(Channel::One).await.unwrap_err();
    assert!(matches!(err, relaywire::RelayError::NotConnected));
}

#[tokio::test]
async fn test_wait_for_disconnect_resolves_on_close() {
    let (listener, config) = fake_device().await;
    let session = RelaySession::connect(config).await.unwrap();
    let (device, _) = listener.accept().await.unwrap();

    drop(device);

    timeout(RECV_TIMEOUT, session.wait_for_disconnect())
        .await
        .expect("wait_for_disconnect never resolved");
}

#[tokio::test]
async fn test_dropping_session_closes_connection() {
    let (listener, config) = fake_device().await;
    let session = RelaySession::connect(config).await.unwrap();
    let (mut device, _) = listener.accept().await.unwrap();

    drop(session);

    // The device side observes EOF promptly instead of a half-open socket.
    let mut buf = [0u8; 1];
    let n = timeout(RECV_TIMEOUT, device.read(&mut buf))
        .await
        .expect("device never saw the session close")
        .unwrap();
    assert_eq!(n, 0);
}

#[tokio::test]
async fn test_connect_refused_is_transport_error() {
    let (listener, config) = fake_device().await;
    drop(listener);

    let err = RelaySession::connect(config).await.unwrap_err();
    assert!(matches!(err, relaywire::RelayError::Io(_)));
}

#[tokio::test]
async fn test_multiple_subscribers_see_same_events() {
    let (listener, config) = fake_device().await;
    let session = RelaySession::connect(config).await.unwrap();
    let (mut device, _) = listener.accept().await.unwrap();

    let mut first = session.subscribe_state();
    let mut second = session.subscribe_state();

    session.close(Channel::One).await.unwrap();
    let _ = read_exact(&mut device, 7).await;

    let expected = StateEvent { channel: Channel::One, state: RelayState::On };
    assert_eq!(next_event(&mut first).await, expected);
    assert_eq!(next_event(&mut second).await, expected);
}
