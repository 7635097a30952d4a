//! Bootstrap document returned by the controller.
//!
//! Only the fields the bridge needs are modelled; everything else in the
//! (very large) document is ignored.

use serde::Deserialize;

use protectbridge_domain::catalog::CatalogSnapshot;
use protectbridge_domain::device::{
    CameraRecord, DeviceRecord, MountType, SensorCapabilities, SensorRecord,
};

use crate::error::ProtectError;

/// Parsed bootstrap: the device catalog plus the stream resume point.
#[derive(Debug)]
pub struct Bootstrap {
    pub last_update_id: Option<String>,
    pub snapshot: CatalogSnapshot,
}

impl Bootstrap {
    /// Parse a bootstrap body. A body without a `cameras` array is rejected.
    pub fn parse(body: &[u8]) -> Result<Self, ProtectError> {
        let document: BootstrapDocument = serde_json::from_slice(body)?;
        Ok(document.into())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BootstrapDocument {
    #[serde(default)]
    last_update_id: Option<String>,
    cameras: Vec<CameraDocument>,
    #[serde(default)]
    sensors: Vec<SensorDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CameraDocument {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    feature_flags: FeatureFlags,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeatureFlags {
    #[serde(default)]
    is_doorbell: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SensorDocument {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    mount_type: Option<String>,
    #[serde(default)]
    motion_settings: Settings,
    #[serde(default)]
    humidity_settings: Settings,
    #[serde(default)]
    temperature_settings: Settings,
    #[serde(default)]
    light_settings: Settings,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Settings {
    #[serde(default)]
    is_enabled: bool,
}

impl From<CameraDocument> for CameraRecord {
    fn from(camera: CameraDocument) -> Self {
        Self {
            id: camera.id,
            name: camera.name,
            supports_doorbell: camera.feature_flags.is_doorbell,
        }
    }
}

impl From<SensorDocument> for SensorRecord {
    fn from(sensor: SensorDocument) -> Self {
        Self {
            id: sensor.id,
            name: sensor.name,
            mount_type: sensor.mount_type.as_deref().map(MountType::from),
            capabilities: SensorCapabilities {
                motion: sensor.motion_settings.is_enabled,
                humidity: sensor.humidity_settings.is_enabled,
                temperature: sensor.temperature_settings.is_enabled,
                light: sensor.light_settings.is_enabled,
            },
        }
    }
}

impl From<BootstrapDocument> for Bootstrap {
    fn from(document: BootstrapDocument) -> Self {
        let cameras = document
            .cameras
            .into_iter()
            .map(|camera| DeviceRecord::Camera(camera.into()));
        let sensors = document
            .sensors
            .into_iter()
            .map(|sensor| DeviceRecord::Sensor(sensor.into()));

        Self {
            last_update_id: document.last_update_id,
            snapshot: CatalogSnapshot::new(cameras.chain(sensors)),
        }
    }
}
