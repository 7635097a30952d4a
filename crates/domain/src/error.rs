//! Common error types used across the workspace.
//!
//! Each adapter defines its own typed errors and converts into one of these
//! at the port boundary, so the application layer only ever sees domain
//! errors.

/// Boxed error used to carry an adapter-specific cause across a port.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Logging into the controller failed.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The controller answered but refused the credentials.
    #[error("controller rejected the credentials")]
    Rejected,

    /// The controller could not be reached or answered unexpectedly.
    #[error("controller login failed")]
    Transport(#[source] BoxError),
}

/// Fetching the device catalog from the controller failed.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// The request did not complete.
    #[error("failed to fetch controller bootstrap")]
    Fetch(#[source] BoxError),

    /// The controller answered with something that is not a bootstrap document.
    #[error("controller bootstrap is malformed")]
    Malformed(#[source] BoxError),

    /// No valid session exists and logging in again failed.
    #[error("controller session is not authenticated")]
    Unauthenticated(#[source] AuthError),
}

/// Writing a value to the output bus failed.
#[derive(Debug, thiserror::Error)]
#[error("failed to publish to {topic}")]
pub struct PublishError {
    /// Topic the write was addressed to.
    pub topic: String,
    /// Underlying client failure.
    #[source]
    pub source: BoxError,
}

/// Top-level error of the bridge.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// Login failure.
    #[error("authentication error")]
    Auth(#[from] AuthError),

    /// Catalog fetch failure.
    #[error("bootstrap error")]
    Bootstrap(#[from] BootstrapError),

    /// Output bus failure.
    #[error("publish error")]
    Publish(#[from] PublishError),

    /// The realtime update stream could not be opened.
    #[error("failed to subscribe to controller updates")]
    Subscription(#[source] BoxError),
}
