//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the translation core and the outside world.
//! They are defined here (in `app`) so that both the core and the adapter layer
//! can depend on them without creating circular dependencies.

pub mod controller;
pub mod health;
pub mod publisher;

pub use controller::ControllerSession;
pub use health::HealthReporter;
pub use publisher::TopicPublisher;
