//! MQTT broker configuration.

use std::time::Duration;

use serde::Deserialize;

/// Configuration for the MQTT connection.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// MQTT broker hostname or IP address.
    pub broker_host: String,
    /// MQTT broker port.
    pub broker_port: u16,
    /// MQTT client identifier.
    pub client_id: String,
    /// Optional broker username.
    pub username: Option<String>,
    /// Optional broker password (only used together with `username`).
    pub password: Option<String>,
    /// Keep-alive interval in seconds.
    pub keep_alive_secs: u16,
    /// Number of outgoing requests buffered while the broker is unreachable.
    pub channel_capacity: usize,
    /// Pause after a connection error before trying again, in seconds.
    pub reconnect_delay_secs: u16,
}

impl MqttConfig {
    #[must_use]
    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(u64::from(self.keep_alive_secs))
    }

    #[must_use]
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(u64::from(self.reconnect_delay_secs))
    }
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker_host: "localhost".to_string(),
            broker_port: 1883,
            client_id: "protectbridge".to_string(),
            username: None,
            password: None,
            keep_alive_secs: 30,
            channel_capacity: 64,
            reconnect_delay_secs: 1,
        }
    }
}
