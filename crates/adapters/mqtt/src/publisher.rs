//! MQTT implementation of the [`TopicPublisher`] port.

use std::sync::Arc;

use rumqttc::{AsyncClient, MqttOptions, QoS};
use tokio::task::JoinHandle;

use protectbridge_app::ports::{HealthReporter, TopicPublisher};
use protectbridge_domain::error::PublishError;
use protectbridge_domain::topic::{PublishOptions, QosLevel, TopicPath};

use crate::config::MqttConfig;
use crate::connection::ConnectionDriver;
use crate::dedup::DedupCache;
use crate::error::MqttError;

/// Publishes to an MQTT broker, writing a topic only when its value changes.
///
/// Cheap to clone: clones share the client and the dedup cache.
#[derive(Clone)]
pub struct MqttPublisher {
    client: AsyncClient,
    dedup: Arc<DedupCache>,
}

impl MqttPublisher {
    /// Create the client and spawn the connection driver.
    ///
    /// The driver reports connection state to `health` and subscribes to
    /// `command_topic` on every (re)connect. Publishes issued while the
    /// broker is unreachable are queued up to the configured capacity; once
    /// the queue is full further writes fail instead of waiting.
    pub fn connect<H: HealthReporter + 'static>(
        config: &MqttConfig,
        command_topic: String,
        health: H,
    ) -> (Self, JoinHandle<()>) {
        let mut options = MqttOptions::new(
            config.client_id.clone(),
            config.broker_host.clone(),
            config.broker_port,
        );
        options.set_keep_alive(config.keep_alive());
        if let Some(username) = &config.username {
            options.set_credentials(
                username.clone(),
                config.password.clone().unwrap_or_default(),
            );
        }

        let (client, eventloop) = AsyncClient::new(options, config.channel_capacity);

        tracing::info!(
            host = %config.broker_host,
            port = config.broker_port,
            client_id = %config.client_id,
            "connecting to MQTT broker"
        );

        let driver = ConnectionDriver {
            client: client.clone(),
            eventloop,
            command_topic,
            health,
            reconnect_delay: config.reconnect_delay(),
        };
        let handle = tokio::spawn(driver.run());

        (Self::with_client(client), handle)
    }

    fn with_client(client: AsyncClient) -> Self {
        Self {
            client,
            dedup: Arc::new(DedupCache::new()),
        }
    }

    /// Request a clean disconnect from the broker.
    pub fn disconnect(&self) {
        if let Err(err) = self.client.try_disconnect() {
            tracing::debug!(err = %MqttError::Client(err), "MQTT disconnect failed");
        }
    }
}

impl TopicPublisher for MqttPublisher {
    async fn publish(
        &self,
        topic: &TopicPath,
        value: &str,
        options: PublishOptions,
    ) -> Result<(), PublishError> {
        if !self.dedup.should_publish(topic.as_str(), value) {
            tracing::trace!(%topic, value, "unchanged, not publishing");
            return Ok(());
        }

        // Never waits on the request queue: the driver may be backing off.
        let result = self.client.try_publish(
            topic.as_str(),
            qos(options.qos),
            options.retain,
            value.as_bytes().to_vec(),
        );

        if let Err(err) = result {
            self.dedup.forget(topic.as_str(), value);
            return Err(MqttError::Client(err).into_publish(topic.as_str()));
        }
        Ok(())
    }
}

fn qos(level: QosLevel) -> QoS {
    match level {
        QosLevel::AtMostOnce => QoS::AtMostOnce,
        QosLevel::AtLeastOnce => QoS::AtLeastOnce,
        QosLevel::ExactlyOnce => QoS::ExactlyOnce,
    }
}
