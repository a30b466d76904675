//! TCP connection establishment, with optional local-endpoint binding.

use std::io;
use std::net::SocketAddr;

use tokio::net::{lookup_host, TcpSocket, TcpStream};

use crate::config::SessionConfig;
use crate::error::Result;

/// Connect to the device described by `config`.
///
/// When the config pins a local endpoint, the socket is bound to it before
/// connecting; otherwise the OS picks. Resolution failures and connect
/// errors surface as `RelayError::Io`.
pub async fn connect(config: &SessionConfig) -> Result<TcpStream> {
    let remote = resolve(&config.device_endpoint()).await?;

    let stream = match config.local_endpoint() {
        Some(local) => {
            let local_addr = resolve(&local).await?;
            let socket = match remote {
                SocketAddr::V4(_) => TcpSocket::new_v4()?,
                SocketAddr::V6(_) => TcpSocket::new_v6()?,
            };
            socket.bind(local_addr)?;
            socket.connect(remote).await?
        }
        None => TcpStream::connect(remote).await?,
    };

    // Commands are 7-byte frames; never let Nagle hold one back.
    stream.set_nodelay(true)?;

    tracing::debug!(peer = %remote, "connected to relay device");
    Ok(stream)
}

/// Resolve `host:port` to the first usable socket address.
async fn resolve(endpoint: &str) -> Result<SocketAddr> {
    lookup_host(endpoint)
        .await?
        .next()
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                format!("no addresses resolved for {endpoint}"),
            )
            .into()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_connect_plain() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let config = SessionConfig::new("127.0.0.1", addr.port());
        let stream = connect(&config).await.unwrap();

        let (accepted, peer) = listener.accept().await.unwrap();
        assert_eq!(peer, stream.local_addr().unwrap());
        drop(accepted);
    }

    #[tokio::test]
    async fn test_connect_with_local_bind() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // Port 0: pin the interface, let the OS pick the port.
        let config =
            SessionConfig::new("127.0.0.1", addr.port()).local_bind("127.0.0.1", 0);
        let stream = connect(&config).await.unwrap();

        assert_eq!(
            stream.local_addr().unwrap().ip(),
            "127.0.0.1".parse::<std::net::IpAddr>().unwrap()
        );
    }

    #[tokio::test]
    async fn test_connect_refused_surfaces_io_error() {
        // Bind then drop to get a port that refuses connections.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let config = SessionConfig::new("127.0.0.1", addr.port());
        let err = connect(&config).await.unwrap_err();
        assert!(matches!(err, crate::RelayError::Io(_)));
    }
}
