//! # protectbridge-adapter-mqtt
//!
//! MQTT adapter — the output bus of the bridge.
//!
//! ## Responsibilities
//! - Connect to an MQTT broker and keep the connection alive
//! - Publish `(topic, value)` pairs, skipping a value identical to the last
//!   one written on the same topic
//! - Report connect / disconnect transitions to the health port
//! - Subscribe to the `{camera_prefix}/+/+/set` command pattern (passthrough
//!   only: commands are logged, not acted upon)
//!
//! ## Dependency rule
//! Same as other adapters: depends on `protectbridge-app` and `protectbridge-domain`.

mod config;
mod connection;
mod dedup;
mod error;
mod publisher;

pub use config::MqttConfig;
pub use connection::command_topic;
pub use dedup::DedupCache;
pub use error::MqttError;
pub use publisher::MqttPublisher;
