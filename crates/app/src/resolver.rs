//! Capability resolver — answers "which device is this and what can it do".
//!
//! A device only resolves when it is in the current snapshot **and** has a
//! usable display name; anything else is a silent no-op for the packet.

use protectbridge_domain::catalog::CatalogSnapshot;
use protectbridge_domain::device::{CameraRecord, DisplayName, SensorRecord};

/// Capability flags a packet field can be gated on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Motion,
    Humidity,
    Temperature,
    Light,
    Doorbell,
}

/// A camera found in the catalog, with its normalised name.
#[derive(Debug, Clone)]
pub struct ResolvedCamera<'a> {
    pub record: &'a CameraRecord,
    pub name: DisplayName,
}

impl ResolvedCamera<'_> {
    #[must_use]
    pub fn supports(&self, capability: Capability) -> bool {
        matches!(capability, Capability::Doorbell) && self.record.supports_doorbell
    }
}

/// A sensor found in the catalog, with its normalised name.
#[derive(Debug, Clone)]
pub struct ResolvedSensor<'a> {
    pub record: &'a SensorRecord,
    pub name: DisplayName,
}

impl ResolvedSensor<'_> {
    #[must_use]
    pub fn supports(&self, capability: Capability) -> bool {
        let caps = &self.record.capabilities;
        match capability {
            Capability::Motion => caps.motion,
            Capability::Humidity => caps.humidity,
            Capability::Temperature => caps.temperature,
            Capability::Light => caps.light,
            Capability::Doorbell => false,
        }
    }
}

/// Resolves identifiers against one catalog snapshot.
#[derive(Debug, Clone, Copy)]
pub struct CapabilityResolver<'a> {
    snapshot: &'a CatalogSnapshot,
}

impl<'a> CapabilityResolver<'a> {
    #[must_use]
    pub fn new(snapshot: &'a CatalogSnapshot) -> Self {
        Self { snapshot }
    }

    #[must_use]
    pub fn camera(&self, id: &str) -> Option<ResolvedCamera<'a>> {
        let record = self.snapshot.lookup_camera(id)?;
        let name = DisplayName::parse(record.name.as_deref())?;
        Some(ResolvedCamera { record, name })
    }

    #[must_use]
    pub fn sensor(&self, id: &str) -> Option<ResolvedSensor<'a>> {
        let record = self.snapshot.lookup_sensor(id)?;
        let name = DisplayName::parse(record.name.as_deref())?;
        Some(ResolvedSensor { record, name })
    }
}
