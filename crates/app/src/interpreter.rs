//! Field interpreters — map a resolved packet payload to bus publications.
//!
//! Interpreters are pure: the same device and payload always yield the same
//! [`Translation`]. Publishing and pulse timers are the caller's job.

pub mod camera;
pub mod detection;
pub mod sensor;

use serde_json::Value;

use protectbridge_domain::topic::{Publication, TopicPath};

/// Everything one packet should produce on the bus.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Translation {
    /// Values to publish now, in order.
    pub publications: Vec<Publication>,
    /// Topics to de-assert once the pulse window elapses.
    pub pulses: Vec<TopicPath>,
}

impl Translation {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.publications.is_empty() && self.pulses.is_empty()
    }
}

/// Field `key` of `object`, unless it is absent or `null`.
fn present<'a>(object: &'a Value, key: &str) -> Option<&'a Value> {
    object.get(key).filter(|value| !value.is_null())
}

/// Loose truthiness of a payload field: absent, `null`, `false`, `0` and
/// `""` are false, anything else is true.
fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(number)) => number.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(text)) => !text.is_empty(),
        Some(Value::Array(_) | Value::Object(_)) => true,
    }
}

/// A measurement exactly as the controller sent it.
fn raw_reading(value: &Value) -> Option<String> {
    match value {
        Value::Number(number) => Some(number.to_string()),
        Value::String(text) => Some(text.clone()),
        _ => None,
    }
}
