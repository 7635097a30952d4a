//! Event packets — the unit of work flowing from the controller to the bus.
//!
//! A packet is classified once by its model key, handled by exactly one
//! interpreter and then dropped.

use serde_json::Value;

/// Model type declared in a packet header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelKey {
    Sensor,
    Event,
    Camera,
    /// Any model the bridge does not translate (lights, chimes, NVR, …).
    Other(String),
}

impl From<&str> for ModelKey {
    fn from(value: &str) -> Self {
        match value {
            "sensor" => Self::Sensor,
            "event" => Self::Event,
            "camera" => Self::Camera,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Routing information of an update, as sent by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketHeader {
    pub action: String,
    pub model_key: ModelKey,
    /// Identifier of the record being updated.
    pub id: Option<String>,
    /// Identifier of the device an `event` record refers to.
    pub record_id: Option<String>,
}

/// A classified-ready update packet.
#[derive(Debug, Clone, PartialEq)]
pub struct EventPacket {
    pub action: String,
    pub model_key: ModelKey,
    /// Device the packet is about. Empty when the header carried no usable
    /// id, which never resolves against the catalog.
    pub subject_id: String,
    pub payload: Value,
}

impl EventPacket {
    /// Assemble a packet from its header and payload.
    ///
    /// `event` packets are about the device named by `record_id`; every other
    /// model is about the record named by `id`.
    #[must_use]
    pub fn new(header: PacketHeader, payload: Value) -> Self {
        let subject_id = match header.model_key {
            ModelKey::Event => header.record_id,
            _ => header.id,
        }
        .unwrap_or_default();

        Self {
            action: header.action,
            model_key: header.model_key,
            subject_id,
            payload,
        }
    }
}

/// Which interpreter handles a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpreterKind {
    Sensor,
    DetectionEvent,
    Camera,
    /// Unknown model: produces no output and no error.
    Ignored,
}

/// Route a packet to its interpreter by model key.
#[must_use]
pub fn classify(packet: &EventPacket) -> InterpreterKind {
    match packet.model_key {
        ModelKey::Sensor => InterpreterKind::Sensor,
        ModelKey::Event => InterpreterKind::DetectionEvent,
        ModelKey::Camera => InterpreterKind::Camera,
        ModelKey::Other(_) => InterpreterKind::Ignored,
    }
}
