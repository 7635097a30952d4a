//! Bridge — drives each inbound packet through classify → resolve → interpret
//! → publish.
//!
//! Packets are handled one at a time against whatever catalog snapshot is
//! current. A failure while handling one packet is logged and never reaches
//! the catalog, pending pulses or the next packet.

use std::time::Duration;

use tokio::sync::mpsc;

use protectbridge_domain::packet::{EventPacket, InterpreterKind, classify};
use protectbridge_domain::topic::{PublishOptions, TopicPrefixes};

use crate::catalog::CatalogReader;
use crate::interpreter::{self, Translation};
use crate::ports::TopicPublisher;
use crate::pulse::{PulsePolicy, PulseScheduler};
use crate::resolver::CapabilityResolver;

/// Event-translation core.
pub struct Bridge<P> {
    catalog: CatalogReader,
    prefixes: TopicPrefixes,
    options: PublishOptions,
    publisher: P,
    pulses: PulseScheduler<P>,
}

impl<P: TopicPublisher + Clone + 'static> Bridge<P> {
    /// Create a bridge publishing through `publisher`.
    pub fn new(
        catalog: CatalogReader,
        prefixes: TopicPrefixes,
        options: PublishOptions,
        publisher: P,
        policy: PulsePolicy,
    ) -> Self {
        let pulses = PulseScheduler::new(publisher.clone(), options, policy);
        Self {
            catalog,
            prefixes,
            options,
            publisher,
            pulses,
        }
    }

    /// Override the pulse window of detection events.
    #[must_use]
    pub fn with_pulse_window(mut self, window: Duration) -> Self {
        self.pulses = self.pulses.with_window(window);
        self
    }

    /// Compute what `packet` should produce, without publishing anything.
    ///
    /// An unknown model, an unknown device or a device without a name all
    /// yield an empty [`Translation`].
    #[must_use]
    pub fn translate(&self, packet: &EventPacket) -> Translation {
        let snapshot = self.catalog.snapshot();
        let resolver = CapabilityResolver::new(&snapshot);
        let id = packet.subject_id.as_str();

        let translation = match classify(packet) {
            InterpreterKind::Sensor => resolver.sensor(id).map(|sensor| {
                interpreter::sensor::interpret(&sensor, &self.prefixes.sensor, &packet.payload)
            }),
            InterpreterKind::DetectionEvent => resolver.camera(id).map(|camera| {
                interpreter::detection::interpret(&camera, &self.prefixes.camera, &packet.payload)
            }),
            InterpreterKind::Camera => resolver.camera(id).map(|camera| {
                interpreter::camera::interpret(&camera, &self.prefixes.camera, &packet.payload)
            }),
            InterpreterKind::Ignored => None,
        };

        translation.unwrap_or_default()
    }

    /// Translate `packet`, publish its values and arm its pulses.
    pub async fn handle(&self, packet: &EventPacket) {
        let translation = self.translate(packet);
        if translation.is_empty() {
            tracing::trace!(
                action = %packet.action,
                model = ?packet.model_key,
                id = %packet.subject_id,
                "packet produced no output"
            );
            return;
        }

        for publication in &translation.publications {
            tracing::debug!(topic = %publication.topic, value = %publication.value, "publishing");
            if let Err(err) = self
                .publisher
                .publish(&publication.topic, &publication.value, self.options)
                .await
            {
                tracing::warn!(%err, topic = %publication.topic, "publish failed");
            }
        }

        for topic in translation.pulses {
            self.pulses.arm(topic);
        }
    }

    /// Handle packets until the stream closes.
    pub async fn run(&self, mut packets: mpsc::Receiver<EventPacket>) {
        while let Some(packet) = packets.recv().await {
            self.handle(&packet).await;
        }
        tracing::info!("controller update stream closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::{Arc, Mutex};

    use protectbridge_domain::catalog::CatalogSnapshot;
    use protectbridge_domain::device::{
        CameraRecord, DeviceRecord, MountType, SensorCapabilities, SensorRecord,
    };
    use protectbridge_domain::error::PublishError;
    use protectbridge_domain::packet::{ModelKey, PacketHeader};
    use protectbridge_domain::topic::TopicPath;
    use serde_json::{Value, json};
    use tokio::time::Instant;

    use crate::catalog::Catalog;

    // ── Recording publisher ────────────────────────────────────────

    #[derive(Clone, Default)]
    struct Recorder {
        writes: Arc<Mutex<Vec<(String, String, Instant)>>>,
        failing_topic: Option<String>,
    }

    impl Recorder {
        fn pairs(&self) -> Vec<(String, String)> {
            self.writes
                .lock()
                .unwrap()
                .iter()
                .map(|(t, v, _)| (t.clone(), v.clone()))
                .collect()
        }
    }

    impl TopicPublisher for Recorder {
        async fn publish(
            &self,
            topic: &TopicPath,
            value: &str,
            _options: PublishOptions,
        ) -> Result<(), PublishError> {
            if self.failing_topic.as_deref() == Some(topic.as_str()) {
                return Err(PublishError {
                    topic: topic.to_string(),
                    source: "bus down".into(),
                });
            }
            self.writes
                .lock()
                .unwrap()
                .push((topic.to_string(), value.to_string(), Instant::now()));
            Ok(())
        }
    }

    fn catalog() -> Catalog {
        Catalog::new(CatalogSnapshot::new(vec![
            DeviceRecord::Camera(CameraRecord {
                id: "cam-front".to_string(),
                name: Some("FrontDoor".to_string()),
                supports_doorbell: true,
            }),
            DeviceRecord::Camera(CameraRecord {
                id: "cam-yard".to_string(),
                name: Some("Back Yard".to_string()),
                supports_doorbell: false,
            }),
            DeviceRecord::Sensor(SensorRecord {
                id: "sensor-leak".to_string(),
                name: Some("Basement".to_string()),
                mount_type: Some(MountType::Leak),
                capabilities: SensorCapabilities::default(),
            }),
            DeviceRecord::Sensor(SensorRecord {
                id: "sensor-door".to_string(),
                name: Some("Garage Door".to_string()),
                mount_type: Some(MountType::Door),
                capabilities: SensorCapabilities {
                    temperature: true,
                    ..SensorCapabilities::default()
                },
            }),
        ]))
    }

    fn bridge(catalog: &Catalog, recorder: &Recorder) -> Bridge<Recorder> {
        Bridge::new(
            catalog.reader(),
            TopicPrefixes::resolve("home", Some("cams"), None),
            PublishOptions::default(),
            recorder.clone(),
            PulsePolicy::Independent,
        )
    }

    fn packet(model: &str, id: &str, payload: Value) -> EventPacket {
        let (id, record_id) = if model == "event" {
            (Some("event-record".to_string()), Some(id.to_string()))
        } else {
            (Some(id.to_string()), None)
        };
        EventPacket::new(
            PacketHeader {
                action: "update".to_string(),
                model_key: ModelKey::from(model),
                id,
                record_id,
            },
            payload,
        )
    }

    fn pair(topic: &str, value: &str) -> (String, String) {
        (topic.to_string(), value.to_string())
    }

    #[tokio::test]
    async fn should_publish_sensor_values_under_sensor_prefix() {
        let catalog = catalog();
        let recorder = Recorder::default();
        let bridge = bridge(&catalog, &recorder);

        bridge
            .handle(&packet(
                "sensor",
                "sensor-door",
                json!({"isOpened": true, "stats": {"temperature": {"value": 19.25}}}),
            ))
            .await;

        assert_eq!(
            recorder.pairs(),
            vec![
                pair("home/garage/door", "1"),
                pair("home/garage/door/temperature", "19.25"),
            ]
        );
    }

    #[tokio::test]
    async fn should_publish_leak_instead_of_open_state() {
        let catalog = catalog();
        let recorder = Recorder::default();
        let bridge = bridge(&catalog, &recorder);

        bridge
            .handle(&packet(
                "sensor",
                "sensor-leak",
                json!({"isOpened": true, "leakDetectedAt": null}),
            ))
            .await;

        assert_eq!(recorder.pairs(), vec![pair("home/basement", "0")]);
    }

    #[tokio::test]
    async fn should_publish_camera_motion_and_ringing() {
        let catalog = catalog();
        let recorder = Recorder::default();
        let bridge = bridge(&catalog, &recorder);

        bridge
            .handle(&packet(
                "camera",
                "cam-front",
                json!({"lastMotion": 1_700_000_000_000_u64, "lastRing": null}),
            ))
            .await;

        assert_eq!(
            recorder.pairs(),
            vec![
                pair("cams/frontdoor", "1"),
                pair("cams/frontdoor/ringing", "0"),
            ]
        );
    }

    #[tokio::test]
    async fn should_suppress_packets_for_unknown_devices() {
        let catalog = catalog();
        let recorder = Recorder::default();
        let bridge = bridge(&catalog, &recorder);

        bridge
            .handle(&packet("camera", "nope", json!({"lastMotion": 1})))
            .await;
        bridge
            .handle(&packet("sensor", "nope", json!({"isOpened": true})))
            .await;
        bridge
            .handle(&packet("event", "nope", json!({"smartDetectTypes": ["person"]})))
            .await;

        assert!(recorder.pairs().is_empty());
    }

    #[tokio::test]
    async fn should_ignore_unknown_models() {
        let catalog = catalog();
        let recorder = Recorder::default();
        let bridge = bridge(&catalog, &recorder);

        let translation = bridge.translate(&packet("light", "cam-front", json!({"isOn": true})));
        assert!(translation.is_empty());
    }

    #[tokio::test]
    async fn should_resolve_event_packets_by_record_id() {
        let catalog = catalog();
        let recorder = Recorder::default();
        let bridge = bridge(&catalog, &recorder);

        let mut event = packet("event", "cam-front", json!({"smartDetectTypes": ["person"]}));
        assert_eq!(event.subject_id, "cam-front");
        assert_eq!(bridge.translate(&event).pulses.len(), 1);

        event.subject_id = "event-record".to_string();
        assert!(bridge.translate(&event).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn should_pulse_detection_for_exactly_the_window() {
        let catalog = catalog();
        let recorder = Recorder::default();
        let bridge = bridge(&catalog, &recorder);
        let start = Instant::now();

        bridge
            .handle(&packet("event", "cam-front", json!({"smartDetectTypes": ["person"]})))
            .await;

        tokio::time::sleep(Duration::from_secs(10)).await;

        let writes = recorder.writes.lock().unwrap().clone();
        assert_eq!(writes.len(), 2);
        assert_eq!((writes[0].0.as_str(), writes[0].1.as_str()), ("cams/frontdoor/person", "1"));
        assert_eq!(writes[0].2, start);
        assert_eq!((writes[1].0.as_str(), writes[1].1.as_str()), ("cams/frontdoor/person", "0"));
        assert_eq!(writes[1].2 - start, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn should_keep_going_after_a_failed_publish() {
        let catalog = catalog();
        let recorder = Recorder {
            failing_topic: Some("cams/frontdoor".to_string()),
            ..Recorder::default()
        };
        let bridge = bridge(&catalog, &recorder);

        bridge
            .handle(&packet("camera", "cam-front", json!({"lastRing": 1})))
            .await;
        bridge
            .handle(&packet("camera", "cam-yard", json!({"lastMotion": 1})))
            .await;

        assert_eq!(
            recorder.pairs(),
            vec![pair("cams/frontdoor/ringing", "1"), pair("cams/back/yard", "1")]
        );
    }

    #[tokio::test]
    async fn should_use_refreshed_catalog_for_next_packet() {
        let catalog = catalog();
        let recorder = Recorder::default();
        let bridge = bridge(&catalog, &recorder);

        catalog.replace(CatalogSnapshot::new(vec![DeviceRecord::Camera(CameraRecord {
            id: "cam-front".to_string(),
            name: Some("Porch".to_string()),
            supports_doorbell: false,
        })]));

        bridge
            .handle(&packet("camera", "cam-front", json!({"lastMotion": 1})))
            .await;

        assert_eq!(recorder.pairs(), vec![pair("cams/porch", "1")]);
    }

    #[tokio::test]
    async fn should_drain_stream_until_closed() {
        let catalog = catalog();
        let recorder = Recorder::default();
        let bridge = bridge(&catalog, &recorder);
        let (tx, rx) = mpsc::channel(8);

        tx.send(packet("camera", "cam-yard", json!({"lastMotion": 1})))
            .await
            .unwrap();
        tx.send(packet("camera", "cam-yard", json!({"lastMotion": null})))
            .await
            .unwrap();
        drop(tx);

        bridge.run(rx).await;

        assert_eq!(
            recorder.pairs(),
            vec![pair("cams/back/yard", "1"), pair("cams/back/yard", "0")]
        );
    }
}
