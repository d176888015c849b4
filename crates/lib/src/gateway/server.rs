//! Webhook HTTP server.

use crate::alexa;
use crate::events::EventChannel;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Shared state for webhook handlers.
#[derive(Clone)]
pub struct WebhookState {
    pub events: Arc<EventChannel>,
    /// Reported by the health probe.
    pub service_id: String,
}

pub const HEALTH_PATH: &str = "/health";

/// Reject webhook paths the router cannot take: the health route, and path parameter or
/// wildcard syntax (`:name`, `*rest`, braces).
pub fn check_webhook_path(path: &str) -> Result<(), String> {
    if !path.starts_with('/') {
        return Err(format!("webhook path {:?} must start with '/'", path));
    }
    if path == HEALTH_PATH {
        return Err(format!("webhook path {} is reserved for the health probe", path));
    }
    if path.contains(|c| matches!(c, ':' | '*' | '{' | '}')) {
        return Err(format!(
            "webhook path {:?} must be a literal path (no ':', '*', or braces)",
            path
        ));
    }
    if path.len() > 1 && path.contains("//") {
        return Err(format!("webhook path {:?} has an empty segment", path));
    }
    Ok(())
}

/// Webhook on `path` (GET and POST, identical handling) plus `GET /health`.
/// `path` must pass [`check_webhook_path`].
pub fn router(state: WebhookState, path: &str) -> Router {
    Router::new()
        .route(HEALTH_PATH, get(health_http))
        .route(path, get(webhook).post(webhook))
        .with_state(state)
}

/// Serve until `shutdown` fires (or its sender is dropped), then drain in-flight requests.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    shutdown: oneshot::Receiver<()>,
) -> std::io::Result<()> {
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = shutdown.await;
        })
        .await
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
pub async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::warn!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                log::warn!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received");
}

/// Platform webhook: normalize, register for the reply, publish, then wait for the reply.
///
/// Exactly one response per request: the reply JSON if one is delivered, otherwise an empty
/// 200 (malformed body, expiry, queue full for the whole reply window, dropped event,
/// disconnect). 503 only when the channel is already closed.
async fn webhook(State(state): State<WebhookState>, body: Bytes) -> Response {
    let value = match alexa::parse_body(&body) {
        Ok(v) => v,
        Err(e) => {
            log::warn!("webhook: {}", e);
            return StatusCode::OK.into_response();
        }
    };
    let event = match alexa::normalize(&value) {
        Ok(ev) => ev,
        Err(e) => {
            log::warn!("webhook: {}", e);
            return StatusCode::OK.into_response();
        }
    };
    let key = event.correlation_key.clone();
    log::debug!(
        "webhook: {} ({}) -> {}",
        event.request_type,
        event.intent_name.as_deref().unwrap_or("-"),
        key
    );

    let (reply_tx, reply_rx) = oneshot::channel();
    let registered = state
        .events
        .replies()
        .register(key.clone(), move |response| {
            // The receiver is gone if the platform hung up; nothing left to answer.
            let _ = reply_tx.send(response);
        })
        .await;
    if !registered {
        log::warn!("webhook: correlation key {} collided, acknowledging without reply", key);
        return StatusCode::OK.into_response();
    }

    if !state.events.publish_event(event).await {
        state.events.replies().expire(&key).await;
        if state.events.is_closed() {
            return StatusCode::SERVICE_UNAVAILABLE.into_response();
        }
        // Queue stayed full for the whole reply window: same outcome as an expired reply.
        return StatusCode::OK.into_response();
    }

    match reply_rx.await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(_) => {
            log::debug!("webhook: {} ended without a reply", key);
            StatusCode::OK.into_response()
        }
    }
}

/// GET /health returns a simple health JSON (for probes).
async fn health_http(State(state): State<WebhookState>) -> Json<serde_json::Value> {
    let replies = state.events.replies();
    let stats = replies.stats();
    let pending = replies.pending().await;
    let runtime = if state.events.is_closed() {
        "closing"
    } else {
        "running"
    };
    Json(json!({
        "runtime": runtime,
        "service": state.service_id,
        "pending": pending,
        "delivered": stats.delivered,
        "expired": stats.expired,
        "unmatched": stats.unmatched,
    }))
}
