//! Voxgate core library: a webhook adapter between a voice assistant platform and a
//! normalized message event format, with replies correlated back to the waiting request.

pub mod activity;
pub mod adapter;
pub mod alexa;
pub mod config;
pub mod correlation;
pub mod error;
pub mod events;
pub mod gateway;
pub mod schema;

pub use adapter::{Adapter, ConnectStatus};
pub use error::AdapterError;
