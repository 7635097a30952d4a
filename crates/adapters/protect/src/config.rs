//! Controller connection configuration.

use std::time::Duration;

use serde::Deserialize;

/// Configuration for the Protect controller session.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProtectConfig {
    /// Controller address. A leading `http://`/`https://` and trailing `/`
    /// are ignored; requests always go over HTTPS.
    pub url: String,
    pub username: String,
    pub password: String,
    /// Verify the controller's TLS certificate. Controllers ship with a
    /// self-signed certificate, so this is off unless a real one is installed.
    pub verify_tls: bool,
    /// Pause before reconnecting a dropped update stream, in seconds.
    pub reconnect_delay_secs: u16,
    /// Number of decoded packets buffered between the stream and the bridge.
    pub channel_capacity: usize,
}

impl ProtectConfig {
    /// Controller host (and optional port) with scheme and trailing slashes
    /// removed.
    #[must_use]
    pub fn host(&self) -> &str {
        strip_scheme(&self.url)
    }

    #[must_use]
    pub fn login_url(&self) -> String {
        format!("https://{}/api/auth/login", self.host())
    }

    #[must_use]
    pub fn bootstrap_url(&self) -> String {
        format!("https://{}/proxy/protect/api/bootstrap", self.host())
    }

    #[must_use]
    pub fn updates_url(&self, last_update_id: Option<&str>) -> String {
        let base = format!("wss://{}/proxy/protect/ws/updates", self.host());
        match last_update_id {
            Some(id) => format!("{base}?lastUpdateId={id}"),
            None => base,
        }
    }

    #[must_use]
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(u64::from(self.reconnect_delay_secs))
    }
}

impl Default for ProtectConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            username: String::new(),
            password: String::new(),
            verify_tls: false,
            reconnect_delay_secs: 5,
            channel_capacity: 256,
        }
    }
}

/// Strip an `http://` or `https://` scheme and any trailing `/`.
#[must_use]
pub fn strip_scheme(url: &str) -> &str {
    let url = url.trim();
    let url = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    url.trim_end_matches('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_have_sensible_defaults() {
        let config = ProtectConfig::default();
        assert!(config.url.is_empty());
        assert!(!config.verify_tls);
        assert_eq!(config.reconnect_delay(), Duration::from_secs(5));
        assert_eq!(config.channel_capacity, 256);
    }

    #[test]
    fn should_deserialize_from_toml() {
        let toml = r#"
            url = "https://192.168.1.1/"
            username = "bridge"
            password = "secret"
            verify_tls = true
            reconnect_delay_secs = 10
        "#;
        let config: ProtectConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.host(), "192.168.1.1");
        assert_eq!(config.username, "bridge");
        assert_eq!(config.password, "secret");
        assert!(config.verify_tls);
        assert_eq!(config.reconnect_delay(), Duration::from_secs(10));
    }

    #[test]
    fn should_strip_scheme_and_trailing_slash() {
        assert_eq!(strip_scheme("https://nvr.local/"), "nvr.local");
        assert_eq!(strip_scheme("http://nvr.local:7443"), "nvr.local:7443");
        assert_eq!(strip_scheme("nvr.local//"), "nvr.local");
        assert_eq!(strip_scheme(" 10.0.0.2 "), "10.0.0.2");
    }

    #[test]
    fn should_build_controller_urls() {
        let config = ProtectConfig {
            url: "https://nvr.local/".to_string(),
            ..ProtectConfig::default()
        };
        assert_eq!(config.login_url(), "https://nvr.local/api/auth/login");
        assert_eq!(
            config.bootstrap_url(),
            "https://nvr.local/proxy/protect/api/bootstrap"
        );
        assert_eq!(
            config.updates_url(Some("abc")),
            "wss://nvr.local/proxy/protect/ws/updates?lastUpdateId=abc"
        );
        assert_eq!(
            config.updates_url(None),
            "wss://nvr.local/proxy/protect/ws/updates"
        );
    }
}
