//! Gateway: the HTTP surface of the adapter.
//!
//! One port serves the voice platform webhook (GET and POST on the configured path) and a
//! health probe. Each webhook request is held open until its correlated reply arrives.

mod server;

pub use server::{
    check_webhook_path, router, serve, wait_for_shutdown_signal, WebhookState, HEALTH_PATH,
};
