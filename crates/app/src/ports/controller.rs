//! Controller port — the camera/sensor controller session.

use std::future::Future;

use tokio::sync::mpsc;

use protectbridge_domain::catalog::CatalogSnapshot;
use protectbridge_domain::error::{AuthError, BootstrapError, BridgeError};
use protectbridge_domain::packet::EventPacket;

/// An authenticated session against the controller.
///
/// The binary crate calls the methods in order:
///
/// 1. [`login`](Self::login) — fatal on failure
/// 2. [`fetch_bootstrap`](Self::fetch_bootstrap) — fatal the first time, then
///    called again on every refresh tick
/// 3. [`subscribe`](Self::subscribe) — realtime packets until the receiver is dropped
pub trait ControllerSession: Send + Sync {
    /// Authenticate with the configured credentials.
    fn login(&self) -> impl Future<Output = Result<(), AuthError>> + Send;

    /// Fetch a complete snapshot of every camera and sensor.
    fn fetch_bootstrap(&self) -> impl Future<Output = Result<CatalogSnapshot, BootstrapError>> + Send;

    /// Open the realtime update stream.
    ///
    /// Reconnecting after a dropped connection is the implementation's job;
    /// the returned channel only closes when the session gives up.
    fn subscribe(
        &self,
    ) -> impl Future<Output = Result<mpsc::Receiver<EventPacket>, BridgeError>> + Send;
}
