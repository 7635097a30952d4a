//! # protectbridge-adapter-protect
//!
//! `UniFi` Protect adapter — the input side of the bridge.
//!
//! ## Responsibilities
//! - Log into the controller and keep the session cookie
//! - Fetch the bootstrap document and turn it into a catalog snapshot
//! - Open the realtime update websocket, decode its binary frames into
//!   event packets and reopen it when it drops
//!
//! ## Dependency rule
//! Same as other adapters: depends on `protectbridge-app` and `protectbridge-domain`.

mod bootstrap;
mod config;
mod error;
pub mod frame;
mod session;

pub use bootstrap::Bootstrap;
pub use config::{ProtectConfig, strip_scheme};
pub use error::ProtectError;
pub use frame::FrameError;
pub use session::ProtectSession;
