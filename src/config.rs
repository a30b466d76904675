//! Session configuration.
//!
//! Deserializable so deployments can keep the device endpoint in a JSON
//! config file; builder-style setters for programmatic construction.

use serde::Deserialize;

/// Connection parameters for one relay device.
///
/// # Example
///
/// ```
/// use relaywire::SessionConfig;
///
/// let config = SessionConfig::new("192.168.1.50", 8899)
///     .local_bind("192.168.1.10", 40000);
/// assert_eq!(config.device_port, 8899);
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Device hostname or IP address.
    pub device_host: String,
    /// Device TCP port.
    pub device_port: u16,
    /// Local interface to bind before connecting, if pinned.
    #[serde(default)]
    pub local_host: Option<String>,
    /// Local port to bind before connecting, if pinned.
    #[serde(default)]
    pub local_port: Option<u16>,
}

impl SessionConfig {
    /// Configuration for the given device endpoint, with an OS-assigned
    /// local endpoint.
    pub fn new(device_host: impl Into<String>, device_port: u16) -> Self {
        Self {
            device_host: device_host.into(),
            device_port,
            local_host: None,
            local_port: None,
        }
    }

    /// Pin the local side of the connection to a specific interface and
    /// port. Some deployments firewall the device to a known peer address.
    pub fn local_bind(mut self, local_host: impl Into<String>, local_port: u16) -> Self {
        self.local_host = Some(local_host.into());
        self.local_port = Some(local_port);
        self
    }

    /// Device endpoint in `host:port` form, for address resolution.
    pub fn device_endpoint(&self) -> String {
        format!("{}:{}", self.device_host, self.device_port)
    }

    /// Local endpoint in `host:port` form, if a local bind is configured.
    /// Port 0 delegates the choice to the OS when only the host is pinned.
    pub fn local_endpoint(&self) -> Option<String> {
        self.local_host
            .as_ref()
            .map(|host| format!("{}:{}", host, self.local_port.unwrap_or(0)))
    }
}
