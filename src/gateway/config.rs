//! Gateway credentials and local bridge configuration.

use crate::error::{FarmError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Key of the device connection string in the `.env` file.
pub const DEVICE_CONNECTION_STRING: &str = "IOTHUB_DEVICE_CONNECTION_STRING";

/// Device credentials from an IoT hub connection string
/// (`HostName=..;DeviceId=..;SharedAccessKey=..`).
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub host_name: String,
    pub device_id: String,
    shared_access_key: String,
}

impl ConnectionConfig {
    /// Load the connection string from a dotenv file. The file must exist.
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(FarmError::config_error(format!(
                "{} does not exist",
                path.display()
            )));
        }

        let entries = dotenvy::from_path_iter(path)
            .map_err(|e| FarmError::config_error(format!("Failed to read {}: {}", path.display(), e)))?;
        for entry in entries {
            let (key, value) =
                entry.map_err(|e| FarmError::config_error(format!("Malformed {}: {}", path.display(), e)))?;
            if key == DEVICE_CONNECTION_STRING {
                return value.parse();
            }
        }

        Err(FarmError::config_error(format!(
            "{} does not contain {}",
            path.display(),
            DEVICE_CONNECTION_STRING
        )))
    }

    pub fn shared_access_key(&self) -> &str {
        &self.shared_access_key
    }
}

impl FromStr for ConnectionConfig {
    type Err = FarmError;

    fn from_str(connection_string: &str) -> Result<Self> {
        let (mut host_name, mut device_id, mut shared_access_key) = (None, None, None);

        for part in connection_string.trim().split(';').filter(|part| !part.is_empty()) {
            let (key, value) = part.split_once('=').ok_or_else(|| {
                FarmError::config_error(format!("connection string segment without '=': {}", part))
            })?;
            match key {
                "HostName" => host_name = Some(value.to_string()),
                "DeviceId" => device_id = Some(value.to_string()),
                "SharedAccessKey" => shared_access_key = Some(value.to_string()),
                _ => {}
            }
        }

        let require = |value: Option<String>, name: &str| {
            value
                .filter(|value| !value.is_empty())
                .ok_or_else(|| FarmError::config_error(format!("connection string is missing {}", name)))
        };

        Ok(Self {
            host_name: require(host_name, "HostName")?,
            device_id: require(device_id, "DeviceId")?,
            shared_access_key: require(shared_access_key, "SharedAccessKey")?,
        })
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host_name", &self.host_name)
            .field("device_id", &self.device_id)
            .field("shared_access_key", &"<redacted>")
            .finish()
    }
}

/// Configuration for the local gateway's HTTP bridge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Host to bind the bridge to
    pub host: String,
    /// Port to bind the bridge to
    pub port: u16,
    /// Whether to enable CORS
    pub enable_cors: bool,
    /// Telemetry messages buffered per stream subscriber
    pub stream_buffer: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: crate::DEFAULT_BRIDGE_PORT,
            enable_cors: true,
            stream_buffer: 16,
        }
    }
}

impl GatewayConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_cors(mut self, enable_cors: bool) -> Self {
        self.enable_cors = enable_cors;
        self
    }

    pub fn with_stream_buffer(mut self, stream_buffer: usize) -> Self {
        self.stream_buffer = stream_buffer;
        self
    }

    /// Get the full bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
