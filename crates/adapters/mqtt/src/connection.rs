//! Connection driver — polls the rumqttc event loop for the process lifetime.

use std::time::Duration;

use rumqttc::{AsyncClient, ConnectReturnCode, ConnectionError, Event, EventLoop, Packet, QoS};

use protectbridge_app::ports::HealthReporter;

use crate::error::MqttError;

/// Command topic pattern subscribed under the camera prefix.
#[must_use]
pub fn command_topic(camera_prefix: &str) -> String {
    let prefix = camera_prefix.trim_end_matches('/');
    if prefix.is_empty() {
        "+/+/set".to_string()
    } else {
        format!("{prefix}/+/+/set")
    }
}

/// Drives the event loop: connection state goes to the health port,
/// commands are logged, errors back off before the next poll (which
/// reconnects).
pub(crate) struct ConnectionDriver<H> {
    pub(crate) client: AsyncClient,
    pub(crate) eventloop: EventLoop,
    pub(crate) command_topic: String,
    pub(crate) health: H,
    pub(crate) reconnect_delay: Duration,
}

impl<H: HealthReporter> ConnectionDriver<H> {
    pub(crate) async fn run(mut self) {
        loop {
            match self.eventloop.poll().await {
                Ok(event) => self.on_event(&event),
                Err(err) => {
                    self.on_connection_error(&err);
                    tokio::time::sleep(self.reconnect_delay).await;
                }
            }
        }
    }

    fn on_event(&self, event: &Event) {
        match event {
            Event::Incoming(Packet::ConnAck(ack)) => {
                if ack.code == ConnectReturnCode::Success {
                    self.on_connected();
                } else {
                    tracing::warn!(code = ?ack.code, "MQTT broker refused the connection");
                    self.health.unhealthy();
                }
            }
            Event::Incoming(Packet::Publish(publish)) => {
                tracing::debug!(
                    topic = %publish.topic,
                    payload = %String::from_utf8_lossy(&publish.payload),
                    "command received, ignoring"
                );
            }
            Event::Incoming(Packet::Disconnect) => {
                tracing::info!("MQTT broker closed the connection");
                self.health.unhealthy();
            }
            _ => {}
        }
    }

    fn on_connection_error(&self, err: &ConnectionError) {
        tracing::warn!(%err, "MQTT connection lost");
        self.health.unhealthy();
    }

    fn on_connected(&self) {
        tracing::info!(topic = %self.command_topic, "MQTT connected, subscribing to commands");
        self.health.healthy();
        if let Err(err) = self
            .client
            .try_subscribe(self.command_topic.as_str(), QoS::AtLeastOnce)
        {
            let err = MqttError::Client(err);
            tracing::warn!(%err, topic = %self.command_topic, "failed to subscribe");
        }
    }
}
