//! # protectbridge-domain
//!
//! Pure domain model for the protectbridge camera/sensor → MQTT bridge.
//!
//! ## Responsibilities
//! - Define **device records** (cameras and sensors with their capability flags)
//! - Define the **catalog snapshot**, an immutable view of every known device
//! - Define **event packets** and the classifier that routes them to an interpreter
//! - Define **topic paths** and publish options for the output bus
//! - Define the error taxonomy shared by ports and adapters
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;

pub mod catalog;
pub mod device;
pub mod packet;
pub mod topic;
