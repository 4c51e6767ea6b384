//! HTTP server implementation using axum.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use futures_util::stream::StreamExt;
use futures_util::SinkExt;
use serde::Deserialize;
use surge_core::{Clock, MarketSignal, SignalSource};
use surge_pricing::DecisionOutcome;
use surge_reconciler::{ReconcilerError, SignalIntake};
use surge_telemetry::Metrics;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};

use crate::board::PriceBoard;
use crate::config::DashboardConfig;
use crate::error::DashboardResult;
use crate::types::{DashboardMessage, ProcessResponse, SignalAccepted, SignalRequest, ViewRequest};

/// Caps concurrent WebSocket connections.
pub struct ConnectionLimiter {
    current: AtomicUsize,
    max: usize,
}

impl ConnectionLimiter {
    pub fn new(max: usize) -> Self {
        Self {
            current: AtomicUsize::new(0),
            max,
        }
    }

    /// Take a slot; the guard can be moved into the upgraded connection.
    pub fn try_acquire(self: &Arc<Self>) -> Option<ConnectionGuard> {
        loop {
            let current = self.current.load(Ordering::Acquire);
            if current >= self.max {
                return None;
            }
            if self
                .current
                .compare_exchange(current, current + 1, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return Some(ConnectionGuard {
                    limiter: Arc::clone(self),
                });
            }
        }
    }

    pub fn current_count(&self) -> usize {
        self.current.load(Ordering::Relaxed)
    }
}

pub struct ConnectionGuard {
    limiter: Arc<ConnectionLimiter>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.limiter.current.fetch_sub(1, Ordering::Release);
    }
}

/// Shared application state for axum handlers.
#[derive(Clone)]
pub struct AppState {
    board: Arc<PriceBoard>,
    intake: Arc<SignalIntake>,
    clock: Arc<dyn Clock>,
    connection_limiter: Arc<ConnectionLimiter>,
    config: DashboardConfig,
}

impl AppState {
    pub fn new(
        board: Arc<PriceBoard>,
        intake: Arc<SignalIntake>,
        clock: Arc<dyn Clock>,
        config: DashboardConfig,
    ) -> Self {
        Self {
            board,
            intake,
            clock,
            connection_limiter: Arc::new(ConnectionLimiter::new(config.max_connections)),
            config,
        }
    }
}

/// Handler error mapped onto a status code.
struct ApiError(ReconcilerError);

impl From<ReconcilerError> for ApiError {
    fn from(e: ReconcilerError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ReconcilerError::InvalidSignal(_) => StatusCode::BAD_REQUEST,
            e if e.is_configuration() => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
struct SubmitParams {
    #[serde(default)]
    immediate: bool,
}

/// Create the axum router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/price", get(get_price))
        .route("/api/state", get(get_state))
        .route("/api/signals", post(submit_signal))
        .route("/api/views", post(record_view))
        .route("/api/reset", post(reset))
        .route("/ws", get(ws_handler))
        .route("/metrics", get(metrics))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn not_found(what: &str) -> Response {
    let body = serde_json::json!({ "error": format!("{what} not available yet") });
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}

async fn get_price(State(state): State<AppState>) -> Response {
    match state.board.latest(&state.config.group_id) {
        Some(record) => Json(record).into_response(),
        None => not_found("price"),
    }
}

async fn get_state(State(state): State<AppState>) -> Result<Response, ApiError> {
    let pricing = state
        .intake
        .store()
        .pricing_state()
        .await
        .map_err(ReconcilerError::from)?;
    Ok(match pricing {
        Some(pricing) => Json(pricing).into_response(),
        None => not_found("pricing state"),
    })
}

async fn submit_signal(
    State(state): State<AppState>,
    Query(params): Query<SubmitParams>,
    Json(req): Json<SignalRequest>,
) -> Result<Response, ApiError> {
    let default_source = if params.immediate {
        SignalSource::Debug
    } else {
        SignalSource::Manual
    };
    let source = req.source.unwrap_or(default_source);

    let signal = match MarketSignal::new(req.signal_type, req.value, source, state.clock.now()) {
        Ok(signal) => signal,
        Err(e) => {
            Metrics::signal_rejected(req.signal_type.as_str());
            warn!(signal_type = %req.signal_type, error = %e, "Signal rejected at intake");
            return Err(ReconcilerError::InvalidSignal(e).into());
        }
    };
    let signal = match req.reason {
        Some(reason) => signal.with_reason(reason),
        None => signal,
    };
    let signal_id = signal.signal_id.clone();

    if !params.immediate {
        state.intake.submit_signal(signal).await?;
        let body = SignalAccepted {
            signal_id,
            status: "queued",
        };
        return Ok((StatusCode::ACCEPTED, Json(body)).into_response());
    }

    let processed = state.intake.process_now(signal).await?;
    let (outcome, price, remaining_ms) = match processed.decision {
        Some(DecisionOutcome::Committed(update)) => ("committed", Some(update.record), None),
        Some(DecisionOutcome::CoolingDown { remaining_ms }) => ("cooling_down", None, Some(remaining_ms)),
        None => ("not_significant", None, None),
    };
    Ok(Json(ProcessResponse {
        signal_id,
        significant: processed.evaluation.is_significant(),
        reason: processed.evaluation.check.reason,
        outcome,
        price,
        remaining_ms,
    })
    .into_response())
}

async fn record_view(
    State(state): State<AppState>,
    Json(req): Json<ViewRequest>,
) -> Result<Response, ApiError> {
    let event = state.intake.record_view(&req.item_id, req.user_id).await?;
    Ok((StatusCode::ACCEPTED, Json(event)).into_response())
}

async fn reset(State(state): State<AppState>) -> Result<Response, ApiError> {
    let record = state.intake.reset().await?;
    Ok(Json(serde_json::json!({ "status": "reset", "price": record })).into_response())
}

async fn metrics() -> Response {
    match Metrics::gather_text() {
        Ok(text) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

/// WebSocket upgrade handler.
async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let guard = match state.connection_limiter.try_acquire() {
        Some(guard) => guard,
        None => {
            warn!(
                current = state.connection_limiter.current_count(),
                max = state.config.max_connections,
                "WebSocket connection limit reached"
            );
            return (StatusCode::SERVICE_UNAVAILABLE, "Too many connections").into_response();
        }
    };

    info!(
        connections = state.connection_limiter.current_count(),
        "New WebSocket connection"
    );

    ws.on_upgrade(move |socket| handle_ws_connection(socket, state, guard))
}

/// Send the latest price, then forward every publish until either side
/// closes.
async fn handle_ws_connection(socket: WebSocket, state: AppState, _guard: ConnectionGuard) {
    let (mut sender, mut receiver) = socket.split();
    let mut broadcast_rx = state.board.subscribe();

    let snapshot = DashboardMessage::Snapshot {
        price: state.board.latest(&state.config.group_id),
    };
    if let Ok(json) = serde_json::to_string(&snapshot) {
        if sender.send(Message::Text(json.into())).await.is_err() {
            debug!("Failed to send initial snapshot, client disconnected");
            return;
        }
    }

    let mut incoming_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Close(_)) => {
                    debug!("Client sent close frame");
                    break;
                }
                Err(e) => {
                    debug!(error = %e, "WebSocket receive error");
                    break;
                }
                _ => {}
            }
        }
    });

    loop {
        tokio::select! {
            result = broadcast_rx.recv() => {
                match result {
                    Ok(msg) => {
                        if sender.send(Message::Text(msg.into())).await.is_err() {
                            debug!("Failed to send message, client disconnected");
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        // Latest-value semantics: skipped prices are superseded.
                        warn!(skipped = n, "WebSocket client lagged, catching up");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("Broadcast channel closed");
                        break;
                    }
                }
            }
            _ = &mut incoming_task => {
                debug!("Incoming task completed, closing connection");
                break;
            }
        }
    }

    incoming_task.abort();
    info!(
        connections = state.connection_limiter.current_count().saturating_sub(1),
        "WebSocket connection closed"
    );
}

/// Bind and serve until the listener fails.
pub async fn run_server(state: AppState) -> DashboardResult<()> {
    let port = state.config.port;
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(port, "Starting dashboard server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
