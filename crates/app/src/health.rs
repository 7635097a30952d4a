//! In-process health flag backed by a tokio [`watch`] channel.

use std::sync::Arc;

use tokio::sync::watch;

use crate::ports::HealthReporter;

/// Shared "is the bus connected" flag.
///
/// Starts unhealthy; the MQTT connection driver flips it on every
/// connect / disconnect and the health endpoint reads it.
#[derive(Debug, Clone)]
pub struct HealthFlag {
    sender: Arc<watch::Sender<bool>>,
}

impl Default for HealthFlag {
    fn default() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }
}

impl HealthFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_healthy(&self) -> bool {
        *self.sender.borrow()
    }

    /// Watch health transitions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.sender.subscribe()
    }

    fn set(&self, healthy: bool) {
        let previous = self.sender.send_replace(healthy);
        if previous != healthy {
            tracing::info!(healthy, "bus health changed");
        }
    }
}

impl HealthReporter for HealthFlag {
    fn healthy(&self) {
        self.set(true);
    }

    fn unhealthy(&self) {
        self.set(false);
    }
}
