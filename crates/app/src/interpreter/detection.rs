//! Detection-event interpreter — smart detections become pulses.
//!
//! The controller reports a detection as a point in time, not a level, so
//! each detected type is asserted now and de-asserted by the pulse scheduler
//! once the window elapses.

use serde_json::Value;

use protectbridge_domain::topic::{ON, Publication, TopicPath};

use super::Translation;
use crate::resolver::ResolvedCamera;

/// Translate an `event` packet for the camera it refers to.
#[must_use]
pub fn interpret(camera: &ResolvedCamera<'_>, prefix: &str, payload: &Value) -> Translation {
    let base = TopicPath::device(prefix, &camera.name);
    let mut translation = Translation::default();

    let Some(types) = payload.get("smartDetectTypes").and_then(Value::as_array) else {
        return translation;
    };

    for detection in types.iter().filter_map(Value::as_str) {
        if detection.is_empty() {
            continue;
        }
        let topic = base.child(detection);
        tracing::debug!(camera = %camera.name, detection, "smart detection");
        translation
            .publications
            .push(Publication::new(topic.clone(), ON));
        translation.pulses.push(topic);
    }

    translation
}
