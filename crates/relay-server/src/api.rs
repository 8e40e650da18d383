use crate::error::ApiError;
use crate::AppState;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use relay_metrics::TelemetrySink;
use relay_types::AlertBatch;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, warn};

const INDEX_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>SNMP Trap Relay</title></head>
<body>
<h1>SNMP Trap Relay</h1>
<p>Alert webhook receiver forwarding notifications as SNMP traps.</p>
<ul>
<li><code>POST /alerts</code></li>
<li><a href="/metrics">Metrics</a></li>
<li><a href="/health">Health</a></li>
</ul>
</body>
</html>
"#;

async fn index() -> Html<&'static str> {
    Html(INDEX_PAGE)
}

async fn health() -> &'static str {
    "Health: OK\n"
}

async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.metrics.export() {
        Ok(text) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to export metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// 解析告警批次并转发为 trap
async fn relay_alerts(state: &AppState, body: &[u8]) -> Result<(), ApiError> {
    let batch: AlertBatch = serde_json::from_slice(body).map_err(|e| {
        warn!(
            error = %e,
            body = %String::from_utf8_lossy(body),
            "Cannot decode alert payload"
        );
        ApiError::from(e)
    })?;

    debug!(
        alerts = batch.alerts.len(),
        receiver = %batch.receiver,
        "Received alert batch"
    );

    let bucket = state.parser.parse(&batch).map_err(|e| {
        warn!(error = %e, batch = ?batch, "Cannot parse alerts");
        ApiError::from(e)
    })?;

    state.sender.send_alert_traps(&bucket).await.map_err(|e| {
        error!(error = %e, groups = ?bucket.keys().collect::<Vec<_>>(), "Cannot send traps");
        ApiError::from(e)
    })
}

async fn receive_alerts(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let response = match relay_alerts(&state, &body).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ok" }))).into_response(),
        Err(e) => e.into_response(),
    };

    state.metrics.record_request(response.status().as_u16());
    response
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/alerts", post(receive_alerts))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .with_state(state)
}
