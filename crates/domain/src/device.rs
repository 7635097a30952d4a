//! Device records — cameras and sensors known to the controller.
//!
//! Records carry only what the bridge needs: identity, display name and the
//! capability flags that gate which facts may be published.

use std::fmt;

/// Normalised display name of a device, ready to be used inside a topic path.
///
/// Names are lowercased and every run of whitespace becomes a `/`, so a
/// camera called `"Front Door"` publishes under `…/front/door`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DisplayName(String);

impl DisplayName {
    /// Normalise a raw controller name.
    ///
    /// Returns `None` when the name is missing or blank: a device without a
    /// usable name must never produce a publish.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        let segments: Vec<String> = raw?.split_whitespace().map(str::to_lowercase).collect();
        if segments.is_empty() {
            return None;
        }
        Some(Self(segments.join("/")))
    }

    /// Borrow the normalised name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a sensor is mounted, which decides what it reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountType {
    Door,
    Window,
    Garage,
    Leak,
    /// The controller reports the sensor as not mounted (`"none"`).
    Unmounted,
    Other(String),
}

impl From<&str> for MountType {
    fn from(value: &str) -> Self {
        match value {
            "door" => Self::Door,
            "window" => Self::Window,
            "garage" => Self::Garage,
            "leak" => Self::Leak,
            "none" => Self::Unmounted,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Camera record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraRecord {
    pub id: String,
    pub name: Option<String>,
    /// The camera is a doorbell and reports rings.
    pub supports_doorbell: bool,
}

/// Which measurements a sensor has enabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct SensorCapabilities {
    pub motion: bool,
    pub humidity: bool,
    pub temperature: bool,
    pub light: bool,
}

/// Sensor record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorRecord {
    pub id: String,
    pub name: Option<String>,
    pub mount_type: Option<MountType>,
    pub capabilities: SensorCapabilities,
}

impl SensorRecord {
    /// Whether this sensor reports leaks on its base topic instead of
    /// open/closed state.
    #[must_use]
    pub fn is_leak_sensor(&self) -> bool {
        self.mount_type == Some(MountType::Leak)
    }
}

/// Either kind of device, as listed by a catalog fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceRecord {
    Camera(CameraRecord),
    Sensor(SensorRecord),
}

impl DeviceRecord {
    /// Controller identifier of the device.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Camera(camera) => &camera.id,
            Self::Sensor(sensor) => &sensor.id,
        }
    }

    /// Normalised display name, if the device has a usable one.
    #[must_use]
    pub fn display_name(&self) -> Option<DisplayName> {
        let raw = match self {
            Self::Camera(camera) => camera.name.as_deref(),
            Self::Sensor(sensor) => sensor.name.as_deref(),
        };
        DisplayName::parse(raw)
    }
}
