//! Camera interpreter — motion and doorbell ringing.
//!
//! Only these two facts are promoted to the bus; every other camera field
//! is dropped.

use serde_json::Value;

use protectbridge_domain::topic::{Publication, TopicPath, flag};

use super::{Translation, present, truthy};
use crate::resolver::{Capability, ResolvedCamera};

/// Translate a `camera` packet payload.
#[must_use]
pub fn interpret(camera: &ResolvedCamera<'_>, prefix: &str, payload: &Value) -> Translation {
    let base = TopicPath::device(prefix, &camera.name);

    let motion =
        truthy(payload.get("isSmartDetected")) || present(payload, "lastMotion").is_some();
    let mut publications = vec![Publication::new(base.clone(), flag(motion))];

    if camera.supports(Capability::Doorbell) {
        let ringing = present(payload, "lastRing").is_some();
        publications.push(Publication::new(base.child("ringing"), flag(ringing)));
    }

    Translation {
        publications,
        pulses: Vec::new(),
    }
}
