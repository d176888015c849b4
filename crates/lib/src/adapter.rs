//! Voice adapter lifecycle: `connect`, `disconnect`, `listen`, `send`.
//!
//! The adapter owns one [`EventChannel`] per connection. `connect` binds the webhook and
//! creates it; `disconnect` closes it (dropping pending replies) and stops the server.

use crate::activity::{InboundEvent, OutboundCommand, SendReceipt};
use crate::alexa;
use crate::config::{self, Config};
use crate::correlation::CorrelationStats;
use crate::error::AdapterError;
use crate::events::EventChannel;
use crate::gateway::{self, WebhookState};
use crate::schema::{self, Operation, ValidationError};
use futures_util::stream::{self, BoxStream, StreamExt};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectStatus {
    Connected,
    AlreadyConnected,
}

struct Running {
    events: Arc<EventChannel>,
    local_addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    server: JoinHandle<()>,
}

pub struct Adapter {
    config: Config,
    running: Mutex<Option<Running>>,
}

impl Adapter {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            running: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Bind the webhook listener and start serving. Calling it again while connected is a no-op.
    pub async fn connect(&self) -> Result<ConnectStatus, AdapterError> {
        let mut g = self.running.lock().await;
        if g.is_some() {
            return Ok(ConnectStatus::AlreadyConnected);
        }

        let path = self.config.adapter.route_path();
        gateway::check_webhook_path(&path).map_err(AdapterError::Config)?;

        let bind = self.config.server.bind.trim();
        if !config::is_loopback_bind(bind) {
            log::warn!(
                "binding webhook to non-loopback address {}; the endpoint has no authentication of its own",
                bind
            );
        }
        let addr = format!("{}:{}", bind, self.config.server.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|source| AdapterError::Bind {
                addr: addr.clone(),
                source,
            })?;
        let local_addr = listener.local_addr().map_err(|source| AdapterError::Bind {
            addr: addr.clone(),
            source,
        })?;

        let adapter_cfg = &self.config.adapter;
        let events = Arc::new(EventChannel::new(
            adapter_cfg.event_buffer,
            adapter_cfg.reply_timeout(),
        ));
        let app = gateway::router(
            WebhookState {
                events: events.clone(),
                service_id: adapter_cfg.service_id.clone(),
            },
            &path,
        );
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let server = tokio::spawn(async move {
            if let Err(e) = gateway::serve(listener, app, shutdown_rx).await {
                log::warn!("webhook server exited with error: {}", e);
            }
        });
        log::info!("webhook listening on http://{}{}", local_addr, path);

        *g = Some(Running {
            events,
            local_addr,
            shutdown: shutdown_tx,
            server,
        });
        Ok(ConnectStatus::Connected)
    }

    /// Close the event channel, drop pending replies, and stop the server. No-op when not connected.
    pub async fn disconnect(&self) {
        let Some(running) = self.running.lock().await.take() else {
            return;
        };
        running.events.close().await;
        let _ = running.shutdown.send(());
        if let Err(e) = running.server.await {
            log::debug!("webhook server task: {}", e);
        }
        log::info!("webhook on {} stopped", running.local_addr);
    }

    pub async fn is_connected(&self) -> bool {
        self.running.lock().await.is_some()
    }

    /// Address actually bound (useful with port 0).
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.running.lock().await.as_ref().map(|r| r.local_addr)
    }

    pub async fn stats(&self) -> Option<CorrelationStats> {
        self.events().await.map(|e| e.replies().stats())
    }

    /// Stream of validated inbound events for the current connection.
    /// Empty when not connected; ends at `disconnect`.
    pub async fn listen(&self) -> BoxStream<'static, InboundEvent> {
        match self.events().await {
            Some(events) => events.stream().boxed(),
            None => stream::empty().boxed(),
        }
    }

    /// Validate, format, and publish a reply. See [`OutboundCommand`] for the payload shape.
    ///
    /// A reply whose correlation key is no longer pending is dropped silently.
    pub async fn send(&self, payload: &Value) -> Result<SendReceipt, AdapterError> {
        schema::validate(payload, Operation::Send)?;
        let command: OutboundCommand =
            serde_json::from_value(payload.clone()).map_err(|e| ValidationError {
                operation: Operation::Send.to_string(),
                path: "$".to_string(),
                reason: e.to_string(),
            })?;
        let response = alexa::format_response(&command)?;
        let key = &command.to.id;
        match self.events().await {
            Some(events) => {
                if !events.publish_reply(key, response).await {
                    log::debug!("send: no pending request for {}", key);
                }
            }
            None => log::debug!("send: not connected, reply for {} dropped", key),
        }
        Ok(SendReceipt::sent(self.config.adapter.service_id.clone()))
    }

    /// Typed form of [`Adapter::send`].
    pub async fn send_command(&self, command: &OutboundCommand) -> Result<SendReceipt, AdapterError> {
        let payload = serde_json::to_value(command)?;
        self.send(&payload).await
    }

    async fn events(&self) -> Option<Arc<EventChannel>> {
        self.running.lock().await.as_ref().map(|r| r.events.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_config() -> Config {
        let mut c = Config::default();
        c.server.port = 0;
        c
    }

    #[tokio::test]
    async fn connect_is_idempotent_and_disconnect_resets() {
        let adapter = Adapter::new(test_config());
        assert_eq!(adapter.connect().await.unwrap(), ConnectStatus::Connected);
        assert_eq!(adapter.connect().await.unwrap(), ConnectStatus::AlreadyConnected);
        assert!(adapter.local_addr().await.is_some());

        adapter.disconnect().await;
        assert!(!adapter.is_connected().await);
        adapter.disconnect().await;

        assert_eq!(adapter.connect().await.unwrap(), ConnectStatus::Connected);
        adapter.disconnect().await;
    }

    #[tokio::test]
    async fn connect_rejects_a_webhook_path_on_the_health_route() {
        let mut config = test_config();
        config.adapter.path = "/health".to_string();
        let adapter = Adapter::new(config);
        let err = adapter.connect().await.unwrap_err();
        assert!(matches!(err, AdapterError::Config(ref m) if m.contains("/health")));
        assert!(!adapter.is_connected().await);

        let mut config = test_config();
        config.adapter.path = "/skills/:id".to_string();
        let err = Adapter::new(config).connect().await.unwrap_err();
        assert!(matches!(err, AdapterError::Config(_)));
    }

    #[tokio::test]
    async fn send_rejects_invalid_payload() {
        let adapter = Adapter::new(test_config());
        let err = adapter
            .send(&json!({ "to": {}, "object": { "type": "Note", "content": "x" } }))
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::Validation(ref v) if v.path == "to.id"));
    }

    #[tokio::test]
    async fn send_rejects_non_note_without_delivering() {
        let adapter = Adapter::new(test_config());
        adapter.connect().await.unwrap();
        let err = adapter
            .send(&json!({ "to": { "id": "k" }, "object": { "type": "Image", "content": "x" } }))
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::UnsupportedContentType(ref t) if t == "Image"));
        let stats = adapter.stats().await.unwrap();
        assert_eq!(stats.delivered + stats.unmatched, 0);
        adapter.disconnect().await;
    }

    #[tokio::test]
    async fn send_to_unknown_key_still_reports_sent() {
        let adapter = Adapter::new(test_config());
        adapter.connect().await.unwrap();
        let receipt = adapter
            .send(&json!({ "to": { "id": "nobody" }, "object": { "type": "Note", "content": "hi" } }))
            .await
            .unwrap();
        assert_eq!(receipt, SendReceipt::sent("alexa"));
        assert_eq!(adapter.stats().await.unwrap().unmatched, 1);
        adapter.disconnect().await;
    }

    #[tokio::test]
    async fn listen_when_disconnected_is_empty() {
        let adapter = Adapter::new(test_config());
        assert!(adapter.listen().await.next().await.is_none());
    }
}
