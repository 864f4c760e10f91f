//! Error handling for the farm agent.

/// A specialized `Result` type for farm agent operations.
pub type Result<T> = std::result::Result<T, FarmError>;

/// The main error type for farm agent operations.
///
/// Sensors never surface these to the farm: a failed sample is logged and
/// turned into an empty reading sequence at the device boundary.
#[derive(Debug, thiserror::Error)]
pub enum FarmError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A peripheral could not be read or driven
    #[error("Hardware error: {0}")]
    Hardware(String),

    /// A device did not deliver a complete sample in time
    #[error("Timed out waiting for {0}")]
    Timeout(String),

    /// A hardware frame or wire value could not be decoded
    #[error("Failed to parse {0}")]
    Parse(String),

    /// JSON encoding or decoding failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An inbound command could not be turned into a typed command
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// The gateway rejected or could not carry a message
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// GPIO operation failed (only available with gpio feature)
    #[cfg(feature = "gpio")]
    #[error("GPIO error: {0}")]
    Gpio(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl FarmError {
    /// Create a new hardware error
    pub fn hardware_error(msg: impl Into<String>) -> Self {
        Self::Hardware(msg.into())
    }

    /// Create a new timeout error naming what was awaited
    pub fn timeout(what: impl Into<String>) -> Self {
        Self::Timeout(what.into())
    }

    /// Create a new parse error
    pub fn parse_error(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a new invalid command error
    pub fn invalid_command(msg: impl Into<String>) -> Self {
        Self::InvalidCommand(msg.into())
    }

    /// Create a new gateway error
    pub fn gateway_error(msg: impl Into<String>) -> Self {
        Self::Gateway(msg.into())
    }

    /// Create a new GPIO error
    #[cfg(feature = "gpio")]
    pub fn gpio_error(msg: impl Into<String>) -> Self {
        Self::Gpio(msg.into())
    }

    /// Create a new configuration error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this error is a transient condition a sensor should swallow.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Timeout(_) | Self::Parse(_) | Self::Hardware(_) | Self::Io(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FarmError::timeout("acceleration sample");
        assert_eq!(err.to_string(), "Timed out waiting for acceleration sample");

        let err = FarmError::config_error("missing connection string");
        assert!(err.to_string().contains("missing connection string"));
    }

    #[test]
    fn test_transient_classification() {
        assert!(FarmError::parse_error("GLL sentence").is_transient());
        assert!(FarmError::hardware_error("i2c nack").is_transient());
        assert!(!FarmError::config_error("bad").is_transient());
        assert!(!FarmError::invalid_command("bad").is_transient());
    }
}
