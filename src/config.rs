use crate::error::{Result, StreamRestoreError};
use std::time::Duration;

/// Port the stream-restore bridge listens on by default
pub const DEFAULT_PORT: u16 = 4714;

/// Host used when no server is configured
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Environment variable naming the server when `--server` is not given
pub const SERVER_ENV: &str = "STREAM_RESTORE_SERVER";

/// Name announced to the server during the handshake
pub const DEFAULT_CLIENT_NAME: &str = "stream-volume";

/// How long a single request may wait for its reply
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings for connecting to the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// `host`, `host:port` or a `ws://`/`wss://` URL; `None` uses the local default
    pub server: Option<String>,
    pub client_name: String,
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server: None,
            client_name: DEFAULT_CLIENT_NAME.to_string(),
            request_timeout: REQUEST_TIMEOUT,
        }
    }
}

impl ClientConfig {
    pub fn new(server: Option<String>) -> Self {
        Self {
            server,
            ..Self::default()
        }
    }

    pub fn with_client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = name.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// WebSocket URL of the configured server
    pub fn url(&self) -> Result<String> {
        let server = match self.server.as_deref().map(str::trim) {
            None => return Ok(format!("ws://{}:{}", DEFAULT_HOST, DEFAULT_PORT)),
            Some("") => {
                return Err(StreamRestoreError::Config("empty server address".to_string()))
            }
            Some(server) => server,
        };

        if server.starts_with("ws://") || server.starts_with("wss://") {
            return Ok(server.to_string());
        }
        if server.contains("://") {
            return Err(StreamRestoreError::Config(format!(
                "unsupported server address '{}'",
                server
            )));
        }

        if let Some((host, port)) = server.rsplit_once(':') {
            let bracketed = host.starts_with('[') && host.ends_with(']');
            if (bracketed || !host.contains(':')) && port.parse::<u16>().is_ok() {
                return Ok(format!("ws://{}:{}", host, port));
            }
        }

        // A bare IPv6 address has no port of its own
        if server.matches(':').count() > 1 && !server.starts_with('[') {
            return Ok(format!("ws://[{}]:{}", server, DEFAULT_PORT));
        }
        Ok(format!("ws://{}:{}", server, DEFAULT_PORT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(server: &str) -> Result<String> {
        ClientConfig::new(Some(server.to_string())).url()
    }

    #[test]
    fn test_default_server() {
        assert_eq!(ClientConfig::default().url().unwrap(), "ws://127.0.0.1:4714");
    }

    #[test]
    fn test_host_and_port_forms() {
        assert_eq!(url("mixer.local").unwrap(), "ws://mixer.local:4714");
        assert_eq!(url("mixer.local:9000").unwrap(), "ws://mixer.local:9000");
        assert_eq!(url("[::1]").unwrap(), "ws://[::1]:4714");
        assert_eq!(url("wss://mixer.local/bridge").unwrap(), "wss://mixer.local/bridge");
    }

    #[test]
    fn test_ipv6_addresses() {
        assert_eq!(url("::1").unwrap(), "ws://[::1]:4714");
        assert_eq!(url("fe80::1").unwrap(), "ws://[fe80::1]:4714");
        assert_eq!(url("[::1]:9000").unwrap(), "ws://[::1]:9000");
        assert_eq!(url("[fe80::1]").unwrap(), "ws://[fe80::1]:4714");
    }

    #[test]
    fn test_rejects_bad_addresses() {
        assert!(matches!(url("  "), Err(StreamRestoreError::Config(_))));
        assert!(matches!(
            url("unix:///run/pulse/native"),
            Err(StreamRestoreError::Config(_))
        ));
    }
}
