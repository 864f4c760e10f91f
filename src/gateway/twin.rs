//! Desired-property handling: the remotely configurable telemetry interval.

use super::{Gateway, TelemetryInterval};
use crate::error::{FarmError, Result};
use serde_json::{json, Value};
use tracing::{info, warn};

/// Desired/reported property holding the telemetry interval in seconds.
pub const TELEMETRY_INTERVAL_KEY: &str = "telemetryInterval";

/// The interval requested by a desired-properties document or patch.
///
/// `Ok(None)` when the document does not mention it; an error when it does
/// but the value is not a positive whole number of seconds.
pub fn requested_interval(document: &Value) -> Result<Option<u64>> {
    let Some(value) = document.get(TELEMETRY_INTERVAL_KEY) else {
        return Ok(None);
    };

    let seconds = value
        .as_u64()
        .or_else(|| {
            value
                .as_f64()
                .filter(|seconds| seconds.fract() == 0.0 && *seconds >= 0.0 && *seconds <= u64::MAX as f64)
                .map(|seconds| seconds as u64)
        })
        .filter(|seconds| *seconds > 0)
        .ok_or_else(|| FarmError::config_error(format!("{} must be a positive integer, got {}", TELEMETRY_INTERVAL_KEY, value)))?;

    Ok(Some(seconds))
}

/// Apply a desired-properties patch and report the accepted interval back.
///
/// Returns whether the interval changed hands. Invalid intervals are logged
/// and left unapplied.
pub async fn apply_desired_patch(gateway: &dyn Gateway, interval: &TelemetryInterval, patch: &Value) -> Result<bool> {
    let seconds = match requested_interval(patch) {
        Ok(Some(seconds)) => seconds,
        Ok(None) => return Ok(false),
        Err(e) => {
            warn!(error = %e, "Ignoring desired telemetry interval");
            return Ok(false);
        }
    };

    interval.set(seconds)?;
    gateway
        .report_properties(json!({ TELEMETRY_INTERVAL_KEY: seconds }))
        .await?;
    info!("New telemetry interval: {} seconds", seconds);
    Ok(true)
}

/// Seed the interval from the desired properties present at startup.
pub async fn sync_initial_interval(gateway: &dyn Gateway, interval: &TelemetryInterval) -> Result<()> {
    let desired = gateway.desired_properties().await?;
    match requested_interval(&desired) {
        Ok(Some(seconds)) => {
            interval.set(seconds)?;
            info!("Telemetry interval from desired properties: {} seconds", seconds);
        }
        Ok(None) => {}
        Err(e) => warn!(error = %e, "Ignoring desired telemetry interval"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::LocalGateway;

    #[test]
    fn test_requested_interval() {
        assert_eq!(requested_interval(&json!({"telemetryInterval": 10})).unwrap(), Some(10));
        assert_eq!(requested_interval(&json!({"telemetryInterval": 10.0})).unwrap(), Some(10));
        assert_eq!(requested_interval(&json!({"other": 1})).unwrap(), None);
        assert!(requested_interval(&json!({"telemetryInterval": 0})).is_err());
        assert!(requested_interval(&json!({"telemetryInterval": -3})).is_err());
        assert!(requested_interval(&json!({"telemetryInterval": 2.5})).is_err());
        assert!(requested_interval(&json!({"telemetryInterval": "10"})).is_err());
    }

    #[tokio::test]
    async fn test_patch_updates_and_reports() {
        let gateway = LocalGateway::new(16);
        let interval = TelemetryInterval::default();

        let applied = apply_desired_patch(&gateway, &interval, &json!({"telemetryInterval": 12}))
            .await
            .unwrap();
        assert!(applied);
        assert_eq!(interval.seconds(), 12);
        assert_eq!(gateway.reported_properties().await["telemetryInterval"], 12);
    }

    #[tokio::test]
    async fn test_invalid_patch_is_not_applied() {
        let gateway = LocalGateway::new(16);
        let interval = TelemetryInterval::default();

        let applied = apply_desired_patch(&gateway, &interval, &json!({"telemetryInterval": "soon"}))
            .await
            .unwrap();
        assert!(!applied);
        assert_eq!(interval.seconds(), 5);
        assert!(gateway.reported_properties().await.get("telemetryInterval").is_none());
    }

    #[tokio::test]
    async fn test_initial_sync() {
        let gateway = LocalGateway::new(16);
        gateway.merge_desired(&json!({"telemetryInterval": 60})).await;
        let interval = TelemetryInterval::default();

        sync_initial_interval(&gateway, &interval).await.unwrap();
        assert_eq!(interval.seconds(), 60);
    }
}
