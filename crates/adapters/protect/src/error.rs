//! Protect adapter error types.

use protectbridge_domain::error::{AuthError, BootstrapError, BridgeError};
use reqwest::StatusCode;

use crate::frame::FrameError;

/// Errors specific to the Protect adapter.
#[derive(Debug, thiserror::Error)]
pub enum ProtectError {
    /// The HTTP request could not be sent or its body not read.
    #[error("HTTP request to the controller failed")]
    Http(#[from] reqwest::Error),

    /// The controller answered with an unexpected status.
    #[error("controller answered with status {0}")]
    Status(StatusCode),

    /// The body is not the expected JSON document.
    #[error("invalid JSON from the controller")]
    Json(#[from] serde_json::Error),

    /// The websocket TLS connector could not be built.
    #[error("failed to set up TLS")]
    Tls(#[from] native_tls::Error),

    /// The update stream failed.
    #[error("update stream error")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// An update message could not be decoded.
    #[error("invalid update frame")]
    Frame(#[from] FrameError),

    /// The login response carried no session cookie.
    #[error("controller login response has no session cookie")]
    MissingCookie,

    /// No session token is held; log in first.
    #[error("not logged in")]
    NotLoggedIn,
}

impl ProtectError {
    /// Convert a login failure into an [`AuthError`].
    #[must_use]
    pub fn into_auth(self) -> AuthError {
        match self {
            Self::Status(StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => AuthError::Rejected,
            other => AuthError::Transport(Box::new(other)),
        }
    }

    /// Convert a catalog fetch failure into a [`BootstrapError`].
    #[must_use]
    pub fn into_bootstrap(self) -> BootstrapError {
        match self {
            Self::Json(_) => BootstrapError::Malformed(Box::new(self)),
            other => BootstrapError::Fetch(Box::new(other)),
        }
    }

    /// Convert an update stream failure into a [`BridgeError`].
    #[must_use]
    pub fn into_subscription(self) -> BridgeError {
        BridgeError::Subscription(Box::new(self))
    }
}
