//! MQTT adapter error types.

use protectbridge_domain::error::PublishError;

/// Errors specific to the MQTT adapter.
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    /// The rumqttc client could not enqueue a request.
    #[error("MQTT client error")]
    Client(#[source] rumqttc::ClientError),
}

impl MqttError {
    /// Convert into a [`PublishError`] for propagation across the publisher
    /// port.
    #[must_use]
    pub fn into_publish(self, topic: &str) -> PublishError {
        PublishError {
            topic: topic.to_string(),
            source: Box::new(self),
        }
    }
}
