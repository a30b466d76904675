//! Relay monitor - connect to a device, toggle relay 1, and print every
//! state event and raw inbound chunk.
//!
//! ```sh
//! cargo run --example monitor -- 192.168.1.50 8899
//! ```

use std::time::Duration;

use relaywire::{Channel, RelaySession, SessionConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "relaywire=debug".into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let host = args.next().unwrap_or_else(|| "127.0.0.1".to_string());
    let port: u16 = args.next().as_deref().unwrap_or("8899").parse()?;

    let session = RelaySession::connect(SessionConfig::new(host, port)).await?;
    let mut events = session.subscribe_state();
    let mut raw = session.subscribe_raw();

    tokio::spawn(async move {
        while let Ok(chunk) = raw.recv().await {
            println!("raw <- {:02x?}", &chunk[..]);
        }
    });

    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            println!("relay {} -> {}", event.channel, event.state);
        }
    });

    session.query_state().await?;
    tokio::time::sleep(Duration::from_millis(500)).await;

    session.close(Channel::One).await?; // relay 1 on
    tokio::time::sleep(Duration::from_secs(1)).await;
    session.open(Channel::One).await?; // relay 1 off

    session.query_state().await?;
    tokio::time::sleep(Duration::from_millis(500)).await;

    Ok(())
}
