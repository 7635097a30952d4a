//! Health port — connectivity transitions of the output bus.

/// Receives bus connect / disconnect notifications.
pub trait HealthReporter: Send + Sync {
    /// The bus connection is up.
    fn healthy(&self);

    /// The bus connection was lost.
    fn unhealthy(&self);
}

impl<T: HealthReporter> HealthReporter for std::sync::Arc<T> {
    fn healthy(&self) {
        (**self).healthy();
    }

    fn unhealthy(&self) {
        (**self).unhealthy();
    }
}
