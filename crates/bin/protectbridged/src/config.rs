//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `protectbridge.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values; their names match the ones the bridge has
//! always been deployed with (`PROTECT_URL`, `TOPIC_PREFIX`, `MQTT_HOST`, ...).

use std::time::Duration;

use serde::Deserialize;

use protectbridge_adapter_mqtt::MqttConfig;
use protectbridge_adapter_protect::{ProtectConfig, strip_scheme};
use protectbridge_app::pulse::PulsePolicy;
use protectbridge_domain::topic::{PublishOptions, QosLevel, TopicPrefixes};

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Controller connection.
    pub protect: ProtectConfig,
    /// MQTT broker connection.
    pub mqtt: MqttConfig,
    /// Topic prefixes.
    pub topics: TopicsConfig,
    /// Translation behaviour.
    pub bridge: BridgeConfig,
    /// Health endpoint.
    pub health: HealthConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Topic prefixes. `camera_prefix` and `sensor_prefix` fall back to `prefix`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TopicsConfig {
    pub prefix: Option<String>,
    pub camera_prefix: Option<String>,
    pub sensor_prefix: Option<String>,
}

/// Translation behaviour.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Seconds between two catalog refreshes.
    pub refresh_interval_secs: u64,
    /// Publish with the retain flag.
    pub retain: bool,
    /// What a repeated detection does to a running pulse.
    pub pulse_policy: PulsePolicy,
}

/// Health endpoint listener.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    pub enabled: bool,
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Load configuration from `protectbridge.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is unusable.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("protectbridge.toml")?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    /// Apply overrides read through `lookup` (the process environment in
    /// production).
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("PROTECT_URL") {
            self.protect.url = val;
        }
        if let Some(val) = lookup("USERNAME") {
            self.protect.username = val;
        }
        if let Some(val) = lookup("PASSWORD") {
            self.protect.password = val;
        }
        if let Some(val) = lookup("TOPIC_PREFIX") {
            self.topics.prefix = Some(val);
        }
        if let Some(val) = lookup("CAMERA_TOPIC_PREFIX") {
            self.topics.camera_prefix = Some(val);
        }
        if let Some(val) = lookup("SENSOR_TOPIC_PREFIX") {
            self.topics.sensor_prefix = Some(val);
        }
        if let Some(secs) = lookup("BOOTSTRAP_POLL_FREQUENCY").and_then(|val| val.parse().ok()) {
            self.bridge.refresh_interval_secs = secs;
        }
        if let Some(retain) = lookup("MQTT_RETAIN").and_then(|val| parse_flag(&val)) {
            self.bridge.retain = retain;
        }
        if let Some(val) = lookup("MQTT_HOST") {
            let (host, port) = parse_broker_address(&val);
            self.mqtt.broker_host = host.to_string();
            if let Some(port) = port {
                self.mqtt.broker_port = port;
            }
        }
        if let Some(port) = lookup("MQTT_PORT").and_then(|val| val.parse().ok()) {
            self.mqtt.broker_port = port;
        }
        if let Some(val) = lookup("MQTT_USER") {
            self.mqtt.username = Some(val);
        }
        if let Some(val) = lookup("MQTT_PASS") {
            self.mqtt.password = Some(val);
        }
        if let Some(port) = lookup("HEALTH_CHECK_PORT").and_then(|val| val.parse().ok()) {
            self.health.port = port;
        }
        if let Some(val) = lookup("PROTECTBRIDGE_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = lookup("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if strip_scheme(&self.protect.url).is_empty() {
            return Err(ConfigError::Validation(
                "controller url (PROTECT_URL) must be set".to_string(),
            ));
        }
        if self.topics.prefix.is_none() {
            return Err(ConfigError::Validation(
                "topic prefix (TOPIC_PREFIX) must be set".to_string(),
            ));
        }
        if self.bridge.refresh_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "refresh interval must be non-zero".to_string(),
            ));
        }
        if self.health.enabled && self.health.port == 0 {
            return Err(ConfigError::Validation(
                "health port must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolved per-category topic prefixes.
    #[must_use]
    pub fn prefixes(&self) -> TopicPrefixes {
        TopicPrefixes::resolve(
            self.topics.prefix.as_deref().unwrap_or_default(),
            self.topics.camera_prefix.as_deref(),
            self.topics.sensor_prefix.as_deref(),
        )
    }

    /// Options attached to every publish. QoS is always at-least-once.
    #[must_use]
    pub fn publish_options(&self) -> PublishOptions {
        PublishOptions {
            qos: QosLevel::AtLeastOnce,
            retain: self.bridge.retain,
        }
    }

    #[must_use]
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.bridge.refresh_interval_secs)
    }

    /// Return the `host:port` bind address of the health endpoint.
    #[must_use]
    pub fn health_bind_addr(&self) -> String {
        format!("{}:{}", self.health.host, self.health.port)
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 60,
            retain: true,
            pulse_policy: PulsePolicy::default(),
        }
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "protectbridged=info,protectbridge=info".to_string(),
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Split `mqtt://host:port` (scheme and port optional) into its parts.
fn parse_broker_address(value: &str) -> (&str, Option<u16>) {
    let value = value.trim();
    let address = value
        .split_once("://")
        .map_or(value, |(_, rest)| rest)
        .trim_end_matches('/');
    match address.rsplit_once(':') {
        Some((host, port)) => match port.parse() {
            Ok(port) => (host, Some(port)),
            Err(_) => (address, None),
        },
        None => (address, None),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    fn valid() -> Config {
        let mut config = Config::default();
        config.protect.url = "https://nvr.local".to_string();
        config.topics.prefix = Some("/protect".to_string());
        config
    }

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert!(config.protect.url.is_empty());
        assert!(config.topics.prefix.is_none());
        assert_eq!(config.bridge.refresh_interval_secs, 60);
        assert!(config.bridge.retain);
        assert_eq!(config.bridge.pulse_policy, PulsePolicy::Independent);
        assert!(config.health.enabled);
        assert_eq!(config.health_bind_addr(), "0.0.0.0:8080");
        assert_eq!(config.logging.filter, "protectbridged=info,protectbridge=info");
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.bridge.refresh_interval_secs, 60);
        assert_eq!(config.mqtt.broker_port, 1883);
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [protect]
            url = 'https://192.168.1.1'
            username = 'bridge'
            password = 'secret'

            [mqtt]
            broker_host = 'mqtt.local'
            broker_port = 1884

            [topics]
            prefix = '/protect'
            camera_prefix = '/cameras'

            [bridge]
            refresh_interval_secs = 120
            retain = false
            pulse_policy = 'coalesce'

            [health]
            enabled = false
            port = 9090

            [logging]
            filter = 'debug'
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.protect.host(), "192.168.1.1");
        assert_eq!(config.protect.username, "bridge");
        assert_eq!(config.mqtt.broker_host, "mqtt.local");
        assert_eq!(config.mqtt.broker_port, 1884);
        assert_eq!(config.topics.prefix.as_deref(), Some("/protect"));
        assert_eq!(config.refresh_interval(), Duration::from_secs(120));
        assert!(!config.bridge.retain);
        assert_eq!(config.bridge.pulse_policy, PulsePolicy::Coalesce);
        assert!(!config.health.enabled);
        assert_eq!(config.health.port, 9090);
        assert_eq!(config.logging.filter, "debug");
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.bridge.refresh_interval_secs, 60);
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }

    #[test]
    fn should_apply_environment_overrides() {
        let mut config = Config::default();
        config.apply_env_overrides(env(&[
            ("PROTECT_URL", "https://nvr.local/"),
            ("USERNAME", "bridge"),
            ("PASSWORD", "secret"),
            ("TOPIC_PREFIX", "/protect"),
            ("SENSOR_TOPIC_PREFIX", "/sensors"),
            ("BOOTSTRAP_POLL_FREQUENCY", "30"),
            ("MQTT_RETAIN", "false"),
            ("MQTT_USER", "mqtt-user"),
            ("MQTT_PASS", "mqtt-pass"),
            ("HEALTH_CHECK_PORT", "9000"),
            ("PROTECTBRIDGE_LOG", "debug"),
        ]));

        assert_eq!(config.protect.host(), "nvr.local");
        assert_eq!(config.protect.username, "bridge");
        assert_eq!(config.protect.password, "secret");
        assert_eq!(config.refresh_interval(), Duration::from_secs(30));
        assert!(!config.publish_options().retain);
        assert_eq!(config.mqtt.username.as_deref(), Some("mqtt-user"));
        assert_eq!(config.mqtt.password.as_deref(), Some("mqtt-pass"));
        assert_eq!(config.health_bind_addr(), "0.0.0.0:9000");
        assert_eq!(config.logging.filter, "debug");

        let prefixes = config.prefixes();
        assert_eq!(prefixes.camera, "/protect");
        assert_eq!(prefixes.sensor, "/sensors");
    }

    #[test]
    fn should_prefer_rust_log_over_own_log_variable() {
        let mut config = Config::default();
        config.apply_env_overrides(env(&[("PROTECTBRIDGE_LOG", "debug"), ("RUST_LOG", "trace")]));
        assert_eq!(config.logging.filter, "trace");
    }

    #[test]
    fn should_ignore_unparseable_numeric_overrides() {
        let mut config = Config::default();
        config.apply_env_overrides(env(&[
            ("BOOTSTRAP_POLL_FREQUENCY", "soon"),
            ("MQTT_PORT", "none"),
            ("MQTT_RETAIN", "maybe"),
        ]));
        assert_eq!(config.bridge.refresh_interval_secs, 60);
        assert_eq!(config.mqtt.broker_port, 1883);
        assert!(config.bridge.retain);
    }

    #[test]
    fn should_parse_broker_url_with_scheme_and_port() {
        let mut config = Config::default();
        config.apply_env_overrides(env(&[("MQTT_HOST", "mqtt://broker.local:1884")]));
        assert_eq!(config.mqtt.broker_host, "broker.local");
        assert_eq!(config.mqtt.broker_port, 1884);
    }

    #[test]
    fn should_let_mqtt_port_override_port_from_host() {
        let mut config = Config::default();
        config.apply_env_overrides(env(&[
            ("MQTT_HOST", "broker.local:1884"),
            ("MQTT_PORT", "1885"),
        ]));
        assert_eq!(config.mqtt.broker_host, "broker.local");
        assert_eq!(config.mqtt.broker_port, 1885);
    }

    #[test]
    fn should_parse_bare_broker_host() {
        assert_eq!(parse_broker_address("broker.local"), ("broker.local", None));
        assert_eq!(parse_broker_address("tcp://10.0.0.5/"), ("10.0.0.5", None));
    }

    #[test]
    fn should_accept_valid_config() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn should_reject_missing_controller_url() {
        let mut config = valid();
        config.protect.url = "https://".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn should_reject_missing_topic_prefix() {
        let mut config = valid();
        config.topics.prefix = None;
        config.topics.camera_prefix = Some("/cameras".to_string());
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn should_reject_zero_refresh_interval() {
        let mut config = valid();
        config.bridge.refresh_interval_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn should_reject_zero_health_port_only_when_enabled() {
        let mut config = valid();
        config.health.port = 0;
        assert!(config.validate().is_err());
        config.health.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_accept_empty_shared_prefix() {
        let mut config = valid();
        config.topics.prefix = Some(String::new());
        assert!(config.validate().is_ok());
        assert_eq!(config.prefixes().camera, "");
    }

    #[test]
    fn should_always_publish_at_least_once() {
        assert_eq!(valid().publish_options().qos, QosLevel::AtLeastOnce);
    }
}
