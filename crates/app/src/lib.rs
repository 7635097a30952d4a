//! # protectbridge-app
//!
//! Application layer — the event-translation core and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `ControllerSession` — login, catalog fetch, realtime update stream
//!   - `TopicPublisher` — deduplicating publish to the output bus
//!   - `HealthReporter` — bus connectivity transitions
//! - Hold the **device catalog** and refresh it on a timer
//! - Resolve packets against device capabilities and interpret their fields
//! - Turn momentary detections into time-bounded **pulses**
//! - Provide **in-process infrastructure** (health flag) that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `protectbridge-domain` only (plus `tokio` for timers and channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod bridge;
pub mod catalog;
pub mod health;
pub mod interpreter;
pub mod ports;
pub mod pulse;
pub mod resolver;
