//! The farm container: every subsystem plus the gateway it reports through.

use crate::error::{FarmError, Result};
use crate::gateway::{Gateway, TelemetryInterval};
use crate::hal::{HardwareSet, Wiring};
use crate::model::{Command, Reading};
use crate::subsystem::{Subsystem, SubsystemKind};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info};

/// One collection cycle: each subsystem's readings under its display name,
/// in subsystem order.
#[derive(Debug, Clone, Default)]
pub struct Telemetry {
    entries: Vec<(SubsystemKind, Vec<Reading>)>,
}

impl Telemetry {
    pub fn get(&self, kind: SubsystemKind) -> Option<&[Reading]> {
        self.entries
            .iter()
            .find(|(entry, _)| *entry == kind)
            .map(|(_, readings)| readings.as_slice())
    }

    pub fn subsystems(&self) -> impl Iterator<Item = SubsystemKind> + '_ {
        self.entries.iter().map(|(kind, _)| *kind)
    }

    pub fn reading_count(&self) -> usize {
        self.entries.iter().map(|(_, readings)| readings.len()).sum()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl Serialize for Telemetry {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (kind, readings) in &self.entries {
            map.serialize_entry(kind.display_name(), readings)?;
        }
        map.end()
    }
}

pub struct Farm {
    subsystems: Vec<Subsystem>,
    gateway: Arc<dyn Gateway>,
}

impl Farm {
    pub fn new(subsystems: Vec<Subsystem>, gateway: Arc<dyn Gateway>) -> Self {
        Self { subsystems, gateway }
    }

    /// The container as wired: geo-location, security, plant.
    pub fn with_hardware(hardware: HardwareSet, wiring: &Wiring, gateway: Arc<dyn Gateway>) -> Self {
        Self::new(Subsystem::defaults(hardware, wiring), gateway)
    }

    pub fn subsystems(&self) -> &[Subsystem] {
        &self.subsystems
    }

    pub fn gateway(&self) -> &Arc<dyn Gateway> {
        &self.gateway
    }

    /// Read every subsystem once.
    pub fn collect_telemetry(&self) -> Telemetry {
        Telemetry {
            entries: self
                .subsystems
                .iter()
                .map(|subsystem| (subsystem.kind(), subsystem.read_sensors()))
                .collect(),
        }
    }

    /// Offer `command` to every subsystem; those without a matching
    /// actuator ignore it.
    ///
    /// Every subsystem gets the command; the first apply failure is returned.
    pub fn dispatch(&self, command: &Command) -> Result<()> {
        let commands = std::slice::from_ref(command);
        let mut outcome = Ok(());
        for subsystem in &self.subsystems {
            if let Err(e) = subsystem.control_actuators(commands) {
                if outcome.is_ok() {
                    outcome = Err(e);
                }
            }
        }
        outcome
    }

    /// Collect off the async runtime, then send one bundle.
    ///
    /// Returns the number of readings sent.
    pub async fn send_readings(self: Arc<Self>) -> Result<usize> {
        let farm = Arc::clone(&self);
        let telemetry = tokio::task::spawn_blocking(move || farm.collect_telemetry())
            .await
            .map_err(|e| FarmError::hardware_error(format!("Telemetry collection panicked: {}", e)))?;

        let payload = telemetry.to_json()?;
        debug!("Sending telemetry: {}", payload);
        self.gateway.send_telemetry(payload).await?;
        Ok(telemetry.reading_count())
    }

    /// Send telemetry, then sleep for the current interval, until `shutdown`
    /// resolves. The gateway is closed on the way out.
    pub async fn run_telemetry_loop<F>(self: Arc<Self>, interval: TelemetryInterval, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            match Arc::clone(&self).send_readings().await {
                Ok(count) => info!("Sent {} readings", count),
                Err(e) => error!("Telemetry cycle failed: {}", e),
            }

            tokio::select! {
                _ = tokio::time::sleep(interval.duration()) => {}
                _ = &mut shutdown => break,
            }
        }

        info!("Stopping telemetry, closing gateway");
        self.gateway.close().await
    }
}

impl std::fmt::Debug for Farm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Farm").field("subsystems", &self.subsystems).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::Fan;
    use crate::gateway::LocalGateway;
    use crate::hal::sim::{SimPin, SimulatedHardware};
    use crate::model::{CommandType, CommandUnit, ReadingType, ReadingValue};
    use serde_json::Value;
    use std::time::Duration;

    fn simulated_farm() -> (SimulatedHardware, Arc<LocalGateway>, Arc<Farm>) {
        let hardware = SimulatedHardware::new();
        let gateway = Arc::new(LocalGateway::default());
        let farm = Farm::with_hardware(hardware.hardware_set(), &Wiring::default(), gateway.clone());
        (hardware, gateway, Arc::new(farm))
    }

    #[test]
    fn test_telemetry_keys_in_subsystem_order() {
        let (_, _, farm) = simulated_farm();
        let json = farm.collect_telemetry().to_json().unwrap();

        let geo = json.find("\"GeoLocationSubsystem\"").unwrap();
        let security = json.find("\"SecuritySubsystem\"").unwrap();
        let plant = json.find("\"PlantSubsystem\"").unwrap();
        assert!(geo < security && security < plant);

        let value: Value = serde_json::from_str(&json).unwrap();
        let first = &value["PlantSubsystem"][0];
        assert_eq!(first["reading_type"], "Soil-Moisture");
        assert_eq!(first["reading_unit"], "%");
    }

    #[test]
    fn test_dispatch_reaches_only_matching_actuator() {
        let fan_relay = SimPin::default();
        let other_relay = SimPin::default();
        let plant = Subsystem::builder(SubsystemKind::Plant)
            .device(Arc::new(Fan::new(Box::new(fan_relay.clone()))))
            .build();
        let security = Subsystem::builder(SubsystemKind::Security)
            .device(Arc::new(crate::devices::Buzzer::new(Box::new(other_relay.clone()))))
            .build();
        let farm = Farm::new(vec![plant, security], Arc::new(LocalGateway::default()));

        farm.dispatch(&Command::new(CommandType::Fan, CommandUnit::Bool, true)).unwrap();
        assert!(fan_relay.level());
        assert!(!other_relay.level());

        let telemetry = farm.collect_telemetry();
        let plant_readings = telemetry.get(SubsystemKind::Plant).unwrap();
        assert_eq!(plant_readings[0].value(), &ReadingValue::Bool(true));
        assert_eq!(
            telemetry.get(SubsystemKind::Security).unwrap()[0].value(),
            &ReadingValue::Bool(false)
        );
    }

    #[test]
    fn test_dispatch_to_simulated_container() {
        let (hardware, _, farm) = simulated_farm();
        farm.dispatch(&Command::new(CommandType::RgbLedStick, CommandUnit::Bool, true))
            .unwrap();

        let telemetry = farm.collect_telemetry();
        let lit = telemetry
            .get(SubsystemKind::Plant)
            .unwrap()
            .iter()
            .find(|reading| reading.reading_type() == ReadingType::RgbLedStick)
            .map(|reading| reading.value().clone());
        assert_eq!(lit, Some(ReadingValue::Bool(true)));
        assert!(!hardware.fan.level());
    }

    #[tokio::test]
    async fn test_send_readings_reaches_gateway() {
        let (_, gateway, farm) = simulated_farm();
        let count = farm.send_readings().await.unwrap();
        assert!(count > 0);

        let message = gateway.latest_telemetry().await.unwrap();
        assert!(message.payload.get("SecuritySubsystem").is_some());
    }

    #[tokio::test]
    async fn test_loop_closes_gateway_on_shutdown() {
        let (_, gateway, farm) = simulated_farm();
        let interval = TelemetryInterval::new(3600).unwrap();

        farm.run_telemetry_loop(interval, tokio::time::sleep(Duration::from_millis(10)))
            .await
            .unwrap();

        assert!(gateway.latest_telemetry().await.is_some());
        assert!(gateway.is_closed());
    }

    #[tokio::test]
    async fn test_failed_send_does_not_stop_the_loop() {
        let (_, gateway, farm) = simulated_farm();
        gateway.close().await.unwrap();

        // Every cycle fails to send; the loop still ends cleanly on shutdown.
        let interval = TelemetryInterval::new(1).unwrap();
        farm.run_telemetry_loop(interval, tokio::time::sleep(Duration::from_millis(10)))
            .await
            .unwrap();
        assert!(gateway.latest_telemetry().await.is_none());
    }
}
