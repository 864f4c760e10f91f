//! # Farm Agent - Container Telemetry and Control
//!
//! The on-device agent of a hydroponic farm container. It samples the
//! container's sensors, sends one telemetry bundle per interval through a
//! cloud gateway, and drives the container's actuators when the gateway
//! delivers a command.
//!
//! ## Features
//!
//! - **Three subsystems**: geo-location, security and plant, each owning its
//!   sensors and actuators
//! - **Fault isolation**: a failing sensor yields no readings, never an error
//! - **Direct methods and desired properties**: remote control and a remotely
//!   tunable telemetry interval
//! - **Local gateway bridge**: HTTP + Server-Sent Events for development and
//!   on-site tooling
//! - **Simulated hardware**: builds and runs anywhere; real peripherals with the
//!   `gpio` feature
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use farm_agent::{Farm, LocalGateway, TelemetryInterval, Wiring};
//! use farm_agent::hal::sim::SimulatedHardware;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> farm_agent::Result<()> {
//!     let hardware = SimulatedHardware::new();
//!     let gateway = Arc::new(LocalGateway::default());
//!     let farm = Arc::new(Farm::with_hardware(hardware.hardware_set(), &Wiring::default(), gateway));
//!
//!     farm.run_telemetry_loop(TelemetryInterval::default(), async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await
//! }
//! ```

pub mod devices;
pub mod error;
pub mod farm;
pub mod gateway;
pub mod hal;
pub mod model;
pub mod subsystem;

// Re-export public API
pub use error::{FarmError, Result};
pub use farm::{Farm, Telemetry};
pub use gateway::{
    create_app, start_gateway_server, AppState, ConnectionConfig, DirectMethod, Gateway, GatewayConfig,
    LocalGateway, MethodResponse, TelemetryInterval, TelemetryMessage,
};
pub use hal::Wiring;
pub use model::{
    Actuator, Command, CommandType, CommandUnit, CommandValue, Device, Reading, ReadingType, ReadingUnit,
    ReadingValue, Sensor,
};
pub use subsystem::{Subsystem, SubsystemBuilder, SubsystemKind};

/// The default telemetry interval in seconds
pub const DEFAULT_TELEMETRY_INTERVAL_SECS: u64 = 5;

/// The default gateway bridge port
pub const DEFAULT_BRIDGE_PORT: u16 = 8080;
