//! Sensor interpreter — open/closed, leak, motion and environmental readings.

use serde_json::Value;

use protectbridge_domain::topic::{Publication, TopicPath, flag};

use super::{Translation, present, raw_reading, truthy};
use crate::resolver::{Capability, ResolvedSensor};

const MEASUREMENTS: [(Capability, &str); 3] = [
    (Capability::Humidity, "humidity"),
    (Capability::Temperature, "temperature"),
    (Capability::Light, "light"),
];

/// Translate a sensor packet payload.
///
/// Leak sensors report on the base topic instead of open/closed state; the
/// two never both appear for one sensor.
#[must_use]
pub fn interpret(sensor: &ResolvedSensor<'_>, prefix: &str, payload: &Value) -> Translation {
    let base = TopicPath::device(prefix, &sensor.name);
    let mut publications = Vec::new();

    if sensor.record.is_leak_sensor() {
        let leaking = present(payload, "leakDetectedAt").is_some();
        publications.push(Publication::new(base.clone(), flag(leaking)));
    } else if let Some(opened) = present(payload, "isOpened") {
        publications.push(Publication::new(base.clone(), flag(truthy(Some(opened)))));
    }

    if sensor.supports(Capability::Motion)
        && let Some(motion) = present(payload, "isMotionDetected")
    {
        publications.push(Publication::new(
            base.child("motion"),
            flag(truthy(Some(motion))),
        ));
    }

    let stats = present(payload, "stats");
    for (capability, measurement) in MEASUREMENTS {
        if !sensor.supports(capability) {
            continue;
        }
        let reading = stats
            .and_then(|stats| present(stats, measurement))
            .and_then(|stat| present(stat, "value"))
            .and_then(raw_reading);
        if let Some(reading) = reading {
            publications.push(Publication::new(base.child(measurement), reading));
        }
    }

    Translation {
        publications,
        pulses: Vec::new(),
    }
}
