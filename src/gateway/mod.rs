//! The agent's side of the cloud gateway.
//!
//! Transport, authentication and reconnection belong to whatever implements
//! [`Gateway`]. This module provides the pieces the agent owns: the
//! direct-method table, desired-property handling, the shared telemetry
//! interval, and an in-process [`LocalGateway`] with an HTTP bridge for
//! machines that are not linked against a managed IoT SDK.

pub mod config;
pub mod local;
pub mod methods;
pub mod server;
pub mod twin;

pub use config::{ConnectionConfig, GatewayConfig};
pub use local::{LocalGateway, TelemetryMessage};
pub use methods::{DirectMethod, MethodResponse};
pub use server::{create_app, start_gateway_server, AppState};

use crate::error::{FarmError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// What the agent needs from a cloud gateway connection.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Send one serialized telemetry bundle. Not retried on failure.
    async fn send_telemetry(&self, payload: String) -> Result<()>;

    /// The current desired-properties document.
    async fn desired_properties(&self) -> Result<Value>;

    /// Merge `patch` into the reported-properties document.
    async fn report_properties(&self, patch: Value) -> Result<()>;

    /// Release the connection. Later sends fail.
    async fn close(&self) -> Result<()>;
}

/// Seconds between telemetry cycles, shared between the telemetry loop and
/// the desired-property handler.
///
/// The loop reads it once per cycle, so a change applies from the next sleep.
#[derive(Debug, Clone)]
pub struct TelemetryInterval {
    seconds: Arc<AtomicU64>,
}

impl TelemetryInterval {
    pub fn new(seconds: u64) -> Result<Self> {
        Self::validate(seconds)?;
        Ok(Self {
            seconds: Arc::new(AtomicU64::new(seconds)),
        })
    }

    pub fn seconds(&self) -> u64 {
        self.seconds.load(Ordering::SeqCst)
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.seconds())
    }

    /// Change the interval; zero is rejected.
    pub fn set(&self, seconds: u64) -> Result<()> {
        Self::validate(seconds)?;
        self.seconds.store(seconds, Ordering::SeqCst);
        Ok(())
    }

    fn validate(seconds: u64) -> Result<()> {
        if seconds == 0 {
            return Err(FarmError::config_error("telemetry interval must be at least one second"));
        }
        Ok(())
    }
}

impl Default for TelemetryInterval {
    fn default() -> Self {
        Self {
            seconds: Arc::new(AtomicU64::new(crate::DEFAULT_TELEMETRY_INTERVAL_SECS)),
        }
    }
}
