//! Device catalog — the current snapshot of every known camera and sensor.
//!
//! The snapshot lives in a tokio [`watch`] channel of `Arc<CatalogSnapshot>`.
//! A refresh builds a complete new snapshot and swaps the pointer in one
//! `send_replace`; readers clone the current `Arc` and look records up in that
//! immutable value, so a lookup never sees a half-built catalog.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use protectbridge_domain::catalog::CatalogSnapshot;
use protectbridge_domain::error::BootstrapError;

use crate::ports::ControllerSession;

/// Owner of the catalog snapshot. Cloning shares the same snapshot.
#[derive(Debug, Clone)]
pub struct Catalog {
    sender: Arc<watch::Sender<Arc<CatalogSnapshot>>>,
}

impl Catalog {
    /// Create a catalog seeded with `initial`.
    #[must_use]
    pub fn new(initial: CatalogSnapshot) -> Self {
        let (sender, _) = watch::channel(Arc::new(initial));
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Create a catalog from the first controller fetch.
    ///
    /// # Errors
    ///
    /// Returns the [`BootstrapError`] of the fetch; at startup this is fatal.
    pub async fn bootstrap<S: ControllerSession>(source: &S) -> Result<Self, BootstrapError> {
        let snapshot = source.fetch_bootstrap().await?;
        tracing::info!(
            cameras = snapshot.camera_count(),
            sensors = snapshot.sensor_count(),
            "catalog bootstrapped"
        );
        Ok(Self::new(snapshot))
    }

    /// A read handle on the current snapshot.
    #[must_use]
    pub fn reader(&self) -> CatalogReader {
        CatalogReader {
            receiver: self.sender.subscribe(),
        }
    }

    /// Swap in a new snapshot wholesale.
    pub fn replace(&self, snapshot: CatalogSnapshot) -> Arc<CatalogSnapshot> {
        let snapshot = Arc::new(snapshot);
        self.sender.send_replace(Arc::clone(&snapshot));
        snapshot
    }

    /// Fetch a fresh snapshot from `source` and swap it in.
    ///
    /// On failure the previous snapshot stays in place untouched.
    ///
    /// # Errors
    ///
    /// Returns the [`BootstrapError`] of the fetch.
    pub async fn refresh<S: ControllerSession>(
        &self,
        source: &S,
    ) -> Result<Arc<CatalogSnapshot>, BootstrapError> {
        let snapshot = source.fetch_bootstrap().await?;
        Ok(self.replace(snapshot))
    }
}

/// Read-only view of the catalog.
#[derive(Debug, Clone)]
pub struct CatalogReader {
    receiver: watch::Receiver<Arc<CatalogSnapshot>>,
}

impl CatalogReader {
    /// The snapshot that is current right now.
    #[must_use]
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        Arc::clone(&self.receiver.borrow())
    }
}

/// Periodically refreshes a [`Catalog`] from the controller.
pub struct CatalogRefresher<S> {
    source: S,
    catalog: Catalog,
    interval: Duration,
}

impl<S: ControllerSession + 'static> CatalogRefresher<S> {
    /// Spawn the refresh loop. The first refresh happens one `interval` from now.
    pub fn start(source: S, catalog: Catalog, interval: Duration) -> JoinHandle<()> {
        let refresher = Self {
            source,
            catalog,
            interval,
        };

        tokio::spawn(refresher.run())
    }

    /// Refresh loop — waits for the interval, refreshes, repeats.
    async fn run(self) {
        loop {
            tokio::time::sleep(self.interval).await;
            self.iterate().await;
        }
    }

    async fn iterate(&self) {
        match self.catalog.refresh(&self.source).await {
            Ok(snapshot) => tracing::debug!(
                cameras = snapshot.camera_count(),
                sensors = snapshot.sensor_count(),
                "catalog refreshed"
            ),
            Err(err) => {
                tracing::warn!(%err, "catalog refresh failed, keeping previous snapshot");
            }
        }
    }
}
