//! ==============================================================================
//! server.rs - http adapter over the reading store
//! ==============================================================================
//!
//! purpose:
//!     translates http requests into store operations and store results into
//!     json responses. this is the only place that knows about status codes.
//!
//! routes (served at the root and again under /api, which the dashboard uses):
//!     POST /sensor-data    device pushes {"pressure": n}    -> 200 | 400
//!     GET  /sensor-data    latest reading + freshness       -> 200
//!     GET  /sensor-status  no_data/active/inactive/disconnected -> 200
//!
//! relationships:
//!     - uses: store.rs (ingest / snapshot / status)
//!     - used by: main.rs (run_server)
//!     - used by: tests/http_api.rs (router + serve on an ephemeral port)
//!
//! middleware:
//!     - cors: permissive, the dashboard is served from another origin
//!     - timeout: 408 after server.request_timeout_ms
//!     - catch-panic: a panicking handler becomes a 500 instead of a dropped connection
//!
//! ==============================================================================

use crate::config::HubConfig;
use crate::domain::{Reading, ReadingView, StatusView};
use crate::error::IngestError;
use crate::store::ReadingStore;

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use log::Level;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, timeout::TimeoutLayer};

// ==============================================================================
// shared state
// ==============================================================================
// cloned into every handler by axum. the store itself is a clone-able handle
// over arc<rwlock<>>, so this clone is cheap.

#[derive(Clone)]
pub struct AppState {
    pub store: ReadingStore,
    /// log accepted readings at info (true) or debug (false)
    pub show_sensor_data: bool,
}

impl AppState {
    pub fn new(store: ReadingStore, show_sensor_data: bool) -> Self {
        Self { store, show_sensor_data }
    }
}

// ==============================================================================
// response bodies
// ==============================================================================

#[derive(Serialize)]
struct IngestResponse {
    status: &'static str,
    message: &'static str,
    data: Reading,
}

#[derive(Serialize)]
struct SnapshotResponse {
    status: &'static str,
    data: ReadingView,
}

#[derive(Serialize)]
struct ErrorResponse {
    status: &'static str,
    error: String,
    kind: &'static str,
}

impl IntoResponse for IngestError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            status: "error",
            error: self.to_string(),
            kind: self.kind(),
        };
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

// ==============================================================================
// router
// ==============================================================================

pub fn router(state: AppState, request_timeout: Duration) -> Router {
    let routes = Router::new()
        .route("/sensor-data", get(snapshot_handler).post(ingest_handler))
        .route("/sensor-status", get(status_handler));

    let app = Router::new().merge(routes.clone()).nest("/api", routes);
    with_middleware(app, request_timeout).with_state(state)
}

/// cors outermost, then panic-to-500, then the per-request timeout (408)
pub fn with_middleware<S>(app: Router<S>, request_timeout: Duration) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    app.layer(TimeoutLayer::new(request_timeout))
        .layer(CatchPanicLayer::new())
        .layer(CorsLayer::permissive())
}

/// bind the configured address and serve until the process exits
pub async fn run_server(config: &HubConfig, state: AppState) -> Result<()> {
    let addr = config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    log::info!("[SERVER] ✓ Listening on http://{}", addr);
    serve(listener, router(state, config.server.request_timeout())).await
}

pub async fn serve(listener: tokio::net::TcpListener, app: Router) -> Result<()> {
    axum::serve(listener, app).await?;
    Ok(())
}

// ==============================================================================
// handlers
// ==============================================================================

/// device ingest endpoint
/// the body is read raw so that a missing or non-json body is reported as a
/// malformed request rather than axum's own rejection
async fn ingest_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<IngestResponse>, IngestError> {
    let payload = serde_json::from_slice::<Value>(&body).ok();

    let reading = match state.store.ingest(payload.as_ref()).await {
        Ok(reading) => reading,
        Err(e) => {
            log::warn!("[INGEST] ⚠ Rejected ({}): {}", e.kind(), e);
            return Err(e);
        }
    };

    let level = if state.show_sensor_data { Level::Info } else { Level::Debug };
    log::log!(
        level,
        "[INGEST] Pressure: {} | Press detected: {}",
        reading.pressure(),
        reading.threshold_exceeded()
    );

    Ok(Json(IngestResponse {
        status: "success",
        message: "Sensor data received",
        data: reading,
    }))
}

async fn snapshot_handler(State(state): State<AppState>) -> Json<SnapshotResponse> {
    let now = state.store.now();
    Json(SnapshotResponse {
        status: "success",
        data: state.store.snapshot(now).await,
    })
}

async fn status_handler(State(state): State<AppState>) -> Json<StatusView> {
    let now = state.store.now();
    Json(state.store.status(now).await)
}
