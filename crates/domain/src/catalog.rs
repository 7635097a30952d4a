//! Catalog snapshot — an immutable, complete view of the controller's devices.
//!
//! A snapshot is built in full before anyone can see it and is never mutated
//! afterwards; refreshing the catalog means building a new snapshot and
//! swapping it in.

use std::collections::HashMap;

use crate::device::{CameraRecord, DeviceRecord, SensorRecord};

/// Point-in-time set of cameras and sensors, indexed by identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogSnapshot {
    cameras: HashMap<String, CameraRecord>,
    sensors: HashMap<String, SensorRecord>,
}

impl CatalogSnapshot {
    /// Build a snapshot from a list of records.
    ///
    /// Identifiers are unique per kind; when the controller lists the same id
    /// twice the last record wins. Records with an empty id are dropped since
    /// no packet can ever address them.
    pub fn new(records: impl IntoIterator<Item = DeviceRecord>) -> Self {
        let mut snapshot = Self::default();
        for record in records {
            match record {
                DeviceRecord::Camera(camera) if !camera.id.is_empty() => {
                    snapshot.cameras.insert(camera.id.clone(), camera);
                }
                DeviceRecord::Sensor(sensor) if !sensor.id.is_empty() => {
                    snapshot.sensors.insert(sensor.id.clone(), sensor);
                }
                _ => {}
            }
        }
        snapshot
    }

    /// Look up a camera by id. Absence is expected and not an error.
    #[must_use]
    pub fn lookup_camera(&self, id: &str) -> Option<&CameraRecord> {
        self.cameras.get(id)
    }

    /// Look up a sensor by id. Absence is expected and not an error.
    #[must_use]
    pub fn lookup_sensor(&self, id: &str) -> Option<&SensorRecord> {
        self.sensors.get(id)
    }

    #[must_use]
    pub fn camera_count(&self) -> usize {
        self.cameras.len()
    }

    #[must_use]
    pub fn sensor_count(&self) -> usize {
        self.sensors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cameras.is_empty() && self.sensors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::SensorCapabilities;

    fn camera(id: &str, name: &str) -> DeviceRecord {
        DeviceRecord::Camera(CameraRecord {
            id: id.to_string(),
            name: Some(name.to_string()),
            supports_doorbell: false,
        })
    }

    fn sensor(id: &str, name: &str) -> DeviceRecord {
        DeviceRecord::Sensor(SensorRecord {
            id: id.to_string(),
            name: Some(name.to_string()),
            mount_type: None,
            capabilities: SensorCapabilities::default(),
        })
    }

    #[test]
    fn should_partition_records_by_kind() {
        let snapshot = CatalogSnapshot::new(vec![camera("a", "Porch"), sensor("b", "Window")]);
        assert_eq!(snapshot.camera_count(), 1);
        assert_eq!(snapshot.sensor_count(), 1);
        assert!(snapshot.lookup_camera("a").is_some());
        assert!(snapshot.lookup_sensor("b").is_some());
    }

    #[test]
    fn should_not_find_camera_in_sensor_partition() {
        let snapshot = CatalogSnapshot::new(vec![camera("a", "Porch")]);
        assert!(snapshot.lookup_sensor("a").is_none());
    }

    #[test]
    fn should_return_none_for_unknown_id() {
        let snapshot = CatalogSnapshot::new(vec![camera("a", "Porch")]);
        assert!(snapshot.lookup_camera("zzz").is_none());
    }

    #[test]
    fn should_keep_last_record_for_duplicate_id() {
        let snapshot = CatalogSnapshot::new(vec![camera("a", "Old"), camera("a", "New")]);
        assert_eq!(snapshot.camera_count(), 1);
        assert_eq!(
            snapshot.lookup_camera("a").unwrap().name.as_deref(),
            Some("New")
        );
    }

    #[test]
    fn should_drop_records_with_empty_id() {
        let snapshot = CatalogSnapshot::new(vec![camera("", "Ghost")]);
        assert!(snapshot.is_empty());
        assert!(snapshot.lookup_camera("").is_none());
    }
}
