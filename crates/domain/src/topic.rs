//! Topic paths, prefixes and publish options for the output bus.

use std::fmt;

use crate::device::DisplayName;

/// Value published for an asserted boolean fact.
pub const ON: &str = "1";
/// Value published for a de-asserted boolean fact.
pub const OFF: &str = "0";

/// Render a boolean fact as a bus value.
#[must_use]
pub fn flag(value: bool) -> &'static str {
    if value { ON } else { OFF }
}

/// A `/`-separated bus topic: `{prefix}/{device-name}[/{suffix}]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TopicPath(String);

impl TopicPath {
    /// Base topic of a device under `prefix`.
    #[must_use]
    pub fn device(prefix: &str, name: &DisplayName) -> Self {
        let prefix = prefix.trim_end_matches('/');
        if prefix.is_empty() {
            Self(name.as_str().to_string())
        } else {
            Self(format!("{prefix}/{name}"))
        }
    }

    /// Sub-topic of this topic.
    #[must_use]
    pub fn child(&self, suffix: &str) -> Self {
        Self(format!("{}/{}", self.0, suffix.trim_matches('/')))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TopicPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-category topic prefixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicPrefixes {
    pub camera: String,
    pub sensor: String,
}

impl TopicPrefixes {
    /// Resolve the category prefixes, falling back to the shared `base` for
    /// any category without an override.
    #[must_use]
    pub fn resolve(base: &str, camera: Option<&str>, sensor: Option<&str>) -> Self {
        Self {
            camera: camera.unwrap_or(base).to_string(),
            sensor: sensor.unwrap_or(base).to_string(),
        }
    }
}

/// MQTT-style delivery guarantee.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QosLevel {
    AtMostOnce,
    #[default]
    AtLeastOnce,
    ExactlyOnce,
}

/// Delivery options attached to every publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishOptions {
    pub qos: QosLevel,
    pub retain: bool,
}

impl Default for PublishOptions {
    fn default() -> Self {
        Self {
            qos: QosLevel::AtLeastOnce,
            retain: true,
        }
    }
}

/// A single `(topic, value)` pair an interpreter wants on the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publication {
    pub topic: TopicPath,
    pub value: String,
}

impl Publication {
    #[must_use]
    pub fn new(topic: TopicPath, value: impl Into<String>) -> Self {
        Self {
            topic,
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(raw: &str) -> DisplayName {
        DisplayName::parse(Some(raw)).unwrap()
    }

    #[test]
    fn should_build_device_topic_under_prefix() {
        let topic = TopicPath::device("/protect/cameras", &name("Front Door"));
        assert_eq!(topic.as_str(), "/protect/cameras/front/door");
    }

    #[test]
    fn should_ignore_trailing_slash_on_prefix() {
        let topic = TopicPath::device("home/", &name("Patio"));
        assert_eq!(topic.as_str(), "home/patio");
    }

    #[test]
    fn should_append_suffix() {
        let topic = TopicPath::device("home", &name("Patio")).child("motion");
        assert_eq!(topic.to_string(), "home/patio/motion");
    }

    #[test]
    fn should_fall_back_to_shared_prefix() {
        let prefixes = TopicPrefixes::resolve("home", Some("cams"), None);
        assert_eq!(prefixes.camera, "cams");
        assert_eq!(prefixes.sensor, "home");
    }

    #[test]
    fn should_render_flags() {
        assert_eq!(flag(true), "1");
        assert_eq!(flag(false), "0");
    }

    #[test]
    fn should_default_to_retained_at_least_once() {
        let options = PublishOptions::default();
        assert_eq!(options.qos, QosLevel::AtLeastOnce);
        assert!(options.retain);
    }
}
