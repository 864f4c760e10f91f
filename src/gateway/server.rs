//! HTTP bridge over the [`LocalGateway`]: telemetry, direct methods and
//! desired properties for tools on the container's network.

use super::config::GatewayConfig;
use super::local::{LocalGateway, TelemetryMessage};
use super::{methods, twin, Gateway, TelemetryInterval};
use crate::error::{FarmError, Result};
use crate::farm::Farm;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Json, Response,
    },
    routing::{get, post},
    Router,
};
use futures_util::Stream;
use serde_json::{json, Value};
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, error, info};

/// Shared state handed to every bridge handler.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<LocalGateway>,
    pub farm: Arc<Farm>,
    pub interval: TelemetryInterval,
}

/// Build the bridge router with tracing and optional CORS.
pub fn create_app(config: &GatewayConfig, state: AppState) -> Router {
    let mut app = Router::new()
        .route("/health", get(health_check))
        .route("/api/telemetry", get(latest_telemetry))
        .route("/api/telemetry/stream", get(telemetry_stream))
        .route("/api/methods/:name", post(invoke_method))
        .route("/api/twin", get(get_twin).patch(patch_twin))
        .with_state(state);

    let service_builder = ServiceBuilder::new().layer(TraceLayer::new_for_http());

    if config.enable_cors {
        app = app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    app.layer(service_builder)
}

/// Serve the bridge until `shutdown` resolves.
pub async fn start_gateway_server<F>(config: GatewayConfig, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_app(&config, state);

    let addr = config
        .bind_address()
        .parse::<SocketAddr>()
        .map_err(|e| FarmError::config_error(format!("Invalid bind address: {}", e)))?;

    info!("Gateway bridge listening on http://{}", addr);
    info!("Telemetry stream: http://{}/api/telemetry/stream", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| FarmError::gateway_error(format!("Failed to bind to address: {}", e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| FarmError::gateway_error(format!("Server error: {}", e)))?;

    info!("Gateway bridge stopped");
    Ok(())
}

/// Health check endpoint.
async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "farm-agent",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn latest_telemetry(State(state): State<AppState>) -> std::result::Result<Json<TelemetryMessage>, StatusCode> {
    state.gateway.latest_telemetry().await.map(Json).ok_or(StatusCode::NOT_FOUND)
}

/// Each telemetry message as a `telemetry` event; lagging clients skip ahead.
async fn telemetry_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let stream = BroadcastStream::new(state.gateway.subscribe()).filter_map(|message| {
        let message = match message {
            Ok(message) => message,
            Err(e) => {
                debug!("Telemetry stream subscriber lagged: {}", e);
                return None;
            }
        };
        match Event::default()
            .event("telemetry")
            .id(message.message_id.to_string())
            .json_data(&message.payload)
        {
            Ok(event) => Some(Ok(event)),
            Err(e) => {
                error!("Failed to encode telemetry event: {}", e);
                None
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Run a direct method. The response status and body are the method's own.
async fn invoke_method(State(state): State<AppState>, Path(name): Path<String>, body: Bytes) -> Response {
    let payload = if body.is_empty() {
        Value::Null
    } else {
        match serde_json::from_slice::<Value>(&body) {
            Ok(payload) => payload,
            Err(e) => {
                let response = methods::MethodResponse::bad_request(format!("Invalid payload {}", e));
                return (StatusCode::BAD_REQUEST, Json(response.payload)).into_response();
            }
        }
    };

    let response = methods::invoke(Arc::clone(&state.farm), name, payload).await;
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(response.payload)).into_response()
}

async fn get_twin(State(state): State<AppState>) -> std::result::Result<Json<Value>, StatusCode> {
    let desired = state.gateway.desired_properties().await.map_err(|e| {
        error!("Failed to read desired properties: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    let reported = state.gateway.reported_properties().await;
    Ok(Json(json!({ "desired": desired, "reported": reported })))
}

/// Merge a desired-properties patch and return the reported document.
async fn patch_twin(
    State(state): State<AppState>,
    Json(patch): Json<Value>,
) -> std::result::Result<Json<Value>, StatusCode> {
    state.gateway.merge_desired(&patch).await;
    twin::apply_desired_patch(state.gateway.as_ref(), &state.interval, &patch)
        .await
        .map_err(|e| {
            error!("Failed to apply desired properties: {}", e);
            StatusCode::SERVICE_UNAVAILABLE
        })?;
    Ok(Json(state.gateway.reported_properties().await))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::security::door_lock::OPEN_PULSE;
    use crate::hal::sim::SimulatedHardware;
    use crate::hal::Wiring;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use tower::ServiceExt;

    fn test_state() -> (SimulatedHardware, AppState) {
        let hardware = SimulatedHardware::new();
        let gateway = Arc::new(LocalGateway::default());
        let farm = Farm::with_hardware(hardware.hardware_set(), &Wiring::default(), gateway.clone());
        let state = AppState {
            gateway,
            farm: Arc::new(farm),
            interval: TelemetryInterval::default(),
        };
        (hardware, state)
    }

    async fn send(state: &AppState, method: Method, uri: &str, body: &str) -> (StatusCode, Value) {
        let app = create_app(&GatewayConfig::default(), state.clone());
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_health_check() {
        let (_, state) = test_state();
        let (status, body) = send(&state, Method::GET, "/health", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_latest_telemetry() {
        let (_, state) = test_state();
        let (status, _) = send(&state, Method::GET, "/api/telemetry", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        Arc::clone(&state.farm).send_readings().await.unwrap();
        let (status, body) = send(&state, Method::GET, "/api/telemetry", "").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["payload"]["PlantSubsystem"].is_array());
        assert!(body["message_id"].is_string());
    }

    #[tokio::test]
    async fn test_door_lock_method() {
        let (hardware, state) = test_state();
        let (status, body) = send(&state, Method::POST, "/api/methods/door-lock", r#"{"value": true}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::Null);
        assert_eq!(hardware.servo.current_pulse(), Some(OPEN_PULSE));
    }

    #[tokio::test]
    async fn test_method_errors() {
        let (_, state) = test_state();

        let (status, body) = send(&state, Method::POST, "/api/methods/door-lock", "{}").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"], "No value was found in the payload");

        let (status, body) = send(&state, Method::POST, "/api/methods/unknown-method", r#"{"value": true}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"], "method name unknown");

        let (status, body) = send(&state, Method::POST, "/api/methods/fan-on", "{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["details"].as_str().unwrap().starts_with("Invalid payload"));
    }

    #[tokio::test]
    async fn test_is_online_without_body() {
        let (_, state) = test_state();
        let (status, body) = send(&state, Method::POST, "/api/methods/is_online", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::Null);
    }

    #[tokio::test]
    async fn test_twin_patch_updates_interval() {
        let (_, state) = test_state();
        let (status, body) = send(&state, Method::PATCH, "/api/twin", r#"{"telemetryInterval": 15}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"telemetryInterval": 15}));
        assert_eq!(state.interval.seconds(), 15);

        let (_, twin) = send(&state, Method::GET, "/api/twin", "").await;
        assert_eq!(twin["desired"]["telemetryInterval"], 15);
        assert_eq!(twin["reported"]["telemetryInterval"], 15);
    }
}
