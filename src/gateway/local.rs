//! In-process gateway: keeps what the cloud would see and fans telemetry out
//! to local subscribers.

use super::Gateway;
use crate::error::{FarmError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{broadcast, RwLock};
use tracing::debug;
use uuid::Uuid;

/// One telemetry bundle as delivered through the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryMessage {
    pub message_id: Uuid,
    pub sent_at: DateTime<Utc>,
    pub payload: Value,
}

pub struct LocalGateway {
    latest: RwLock<Option<TelemetryMessage>>,
    desired: RwLock<Value>,
    reported: RwLock<Value>,
    events: broadcast::Sender<TelemetryMessage>,
    closed: AtomicBool,
}

/// Shallow-merge the keys of `patch` into `document`.
fn merge(document: &mut Value, patch: &Value) {
    let Some(patch) = patch.as_object() else {
        return;
    };
    if !document.is_object() {
        *document = Value::Object(Map::new());
    }
    if let Some(document) = document.as_object_mut() {
        for (key, value) in patch {
            document.insert(key.clone(), value.clone());
        }
    }
}

impl LocalGateway {
    /// `buffer` telemetry messages are kept for each slow subscriber.
    pub fn new(buffer: usize) -> Self {
        let (events, _) = broadcast::channel(buffer.max(1));
        Self {
            latest: RwLock::new(None),
            desired: RwLock::new(Value::Object(Map::new())),
            reported: RwLock::new(Value::Object(Map::new())),
            events,
            closed: AtomicBool::new(false),
        }
    }

    /// Receive every telemetry message sent from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<TelemetryMessage> {
        self.events.subscribe()
    }

    pub async fn latest_telemetry(&self) -> Option<TelemetryMessage> {
        self.latest.read().await.clone()
    }

    /// Record a desired-properties patch as the cloud side would.
    pub async fn merge_desired(&self, patch: &Value) {
        merge(&mut *self.desired.write().await, patch);
    }

    pub async fn reported_properties(&self) -> Value {
        self.reported.read().await.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Default for LocalGateway {
    fn default() -> Self {
        Self::new(16)
    }
}

#[async_trait]
impl Gateway for LocalGateway {
    async fn send_telemetry(&self, payload: String) -> Result<()> {
        if self.is_closed() {
            return Err(FarmError::gateway_error("gateway is closed"));
        }

        let message = TelemetryMessage {
            message_id: Uuid::new_v4(),
            sent_at: Utc::now(),
            payload: serde_json::from_str(&payload)?,
        };
        debug!(message_id = %message.message_id, "Telemetry delivered");

        *self.latest.write().await = Some(message.clone());
        // No subscribers is fine.
        let _ = self.events.send(message);
        Ok(())
    }

    async fn desired_properties(&self) -> Result<Value> {
        Ok(self.desired.read().await.clone())
    }

    async fn report_properties(&self, patch: Value) -> Result<()> {
        if self.is_closed() {
            return Err(FarmError::gateway_error("gateway is closed"));
        }
        merge(&mut *self.reported.write().await, &patch);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
