//! Authenticated controller session: login, bootstrap fetch and the
//! realtime update listener.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::StatusCode;
use reqwest::header::{COOKIE, HeaderMap, SET_COOKIE};
use serde::Serialize;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{Connector, MaybeTlsStream, WebSocketStream};

use protectbridge_app::ports::ControllerSession;
use protectbridge_domain::catalog::CatalogSnapshot;
use protectbridge_domain::error::{AuthError, BootstrapError, BridgeError};
use protectbridge_domain::packet::EventPacket;

use crate::bootstrap::Bootstrap;
use crate::config::ProtectConfig;
use crate::error::ProtectError;
use crate::frame;

const CSRF_HEADER: &str = "x-csrf-token";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

type UpdateStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Credentials captured from a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SessionToken {
    /// `name=value` pair of the session cookie.
    cookie: String,
    csrf: Option<String>,
}

impl SessionToken {
    fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let cookie = headers
            .get(SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(';').next())
            .map(str::trim)
            .filter(|pair| !pair.is_empty())?;
        let csrf = headers
            .get(CSRF_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        Some(Self {
            cookie: cookie.to_string(),
            csrf,
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
    remember_me: bool,
}

struct Inner {
    config: ProtectConfig,
    http: reqwest::Client,
    tls: native_tls::TlsConnector,
    token: Mutex<Option<SessionToken>>,
    last_update_id: Mutex<Option<String>>,
}

/// Session against a `UniFi` Protect controller.
///
/// Cheap to clone: clones share the HTTP client and the session token.
#[derive(Clone)]
pub struct ProtectSession {
    inner: Arc<Inner>,
}

impl ProtectSession {
    /// Build the HTTP client and TLS connector. Nothing is sent until
    /// [`login`](ControllerSession::login) is called.
    pub fn new(config: ProtectConfig) -> Result<Self, ProtectError> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(!config.verify_tls)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        let tls = native_tls::TlsConnector::builder()
            .danger_accept_invalid_certs(!config.verify_tls)
            .danger_accept_invalid_hostnames(!config.verify_tls)
            .build()?;

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                http,
                tls,
                token: Mutex::new(None),
                last_update_id: Mutex::new(None),
            }),
        })
    }

    fn token(&self) -> Option<SessionToken> {
        self.inner
            .token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_token(&self, token: Option<SessionToken>) {
        *self
            .inner
            .token
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = token;
    }

    fn last_update_id(&self) -> Option<String> {
        self.inner
            .last_update_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn remember_update_id(&self, id: String) {
        *self
            .inner
            .last_update_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(id);
    }

    async fn try_login(&self) -> Result<(), ProtectError> {
        let config = &self.inner.config;
        let response = self
            .inner
            .http
            .post(config.login_url())
            .json(&LoginRequest {
                username: &config.username,
                password: &config.password,
                remember_me: true,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            self.set_token(None);
            return Err(ProtectError::Status(status));
        }

        let token =
            SessionToken::from_headers(response.headers()).ok_or(ProtectError::MissingCookie)?;
        self.set_token(Some(token));
        Ok(())
    }

    async fn try_fetch_bootstrap(&self) -> Result<Bootstrap, ProtectError> {
        let token = self.token().ok_or(ProtectError::NotLoggedIn)?;
        let mut request = self
            .inner
            .http
            .get(self.inner.config.bootstrap_url())
            .header(COOKIE, token.cookie);
        if let Some(csrf) = token.csrf {
            request = request.header(CSRF_HEADER, csrf);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProtectError::Status(status));
        }

        let body = response.bytes().await?;
        Bootstrap::parse(&body)
    }

    async fn connect_updates(&self) -> Result<UpdateStream, ProtectError> {
        let token = self.token().ok_or(ProtectError::NotLoggedIn)?;
        let url = self
            .inner
            .config
            .updates_url(self.last_update_id().as_deref());

        let mut request = url.into_client_request()?;
        let cookie = HeaderValue::from_str(&token.cookie)
            .map_err(|err| tungstenite::Error::HttpFormat(err.into()))?;
        request.headers_mut().insert(COOKIE, cookie);

        let connector = Connector::NativeTls(self.inner.tls.clone());
        let (stream, _) =
            tokio_tungstenite::connect_async_tls_with_config(request, None, false, Some(connector))
                .await?;
        tracing::info!(host = %self.inner.config.host(), "update stream connected");
        Ok(stream)
    }

    /// Forward decoded packets until the stream ends. Returns `false` once
    /// the receiving side is gone.
    async fn forward(&self, stream: &mut UpdateStream, sender: &mpsc::Sender<EventPacket>) -> bool {
        loop {
            let message = tokio::select! {
                () = sender.closed() => return false,
                message = stream.next() => message,
            };

            match message {
                Some(Ok(Message::Binary(data))) => match frame::decode(&data) {
                    Ok(update) => {
                        if let Some(id) = update.new_update_id {
                            self.remember_update_id(id);
                        }
                        tracing::debug!(
                            action = %update.packet.action,
                            model = ?update.packet.model_key,
                            subject = %update.packet.subject_id,
                            "update received"
                        );
                        if sender.send(update.packet).await.is_err() {
                            return false;
                        }
                    }
                    Err(err) => {
                        tracing::warn!(%err, len = data.len(), "skipping undecodable update");
                    }
                },
                Some(Ok(Message::Close(close))) => {
                    tracing::info!(?close, "update stream closed by the controller");
                    return true;
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    tracing::warn!(%err, "update stream failed");
                    return true;
                }
                None => {
                    tracing::info!("update stream ended");
                    return true;
                }
            }
        }
    }

    /// Log in again and reopen the stream, retrying until it works or the
    /// receiving side is gone.
    async fn reconnect(&self, sender: &mpsc::Sender<EventPacket>) -> Option<UpdateStream> {
        loop {
            tokio::select! {
                () = sender.closed() => return None,
                () = tokio::time::sleep(self.inner.config.reconnect_delay()) => {}
            }

            if let Err(err) = self.try_login().await {
                tracing::warn!(%err, "re-login failed, will retry");
                continue;
            }
            match self.connect_updates().await {
                Ok(stream) => return Some(stream),
                Err(err) => tracing::warn!(%err, "failed to reopen update stream, will retry"),
            }
        }
    }

    async fn listen(self, mut stream: UpdateStream, sender: mpsc::Sender<EventPacket>) {
        loop {
            if !self.forward(&mut stream, &sender).await {
                break;
            }
            match self.reconnect(&sender).await {
                Some(next) => stream = next,
                None => break,
            }
        }
        tracing::info!("update receiver dropped, listener stopped");
    }
}

impl ControllerSession for ProtectSession {
    async fn login(&self) -> Result<(), AuthError> {
        self.try_login().await.map_err(ProtectError::into_auth)?;
        tracing::info!(host = %self.inner.config.host(), "logged into controller");
        Ok(())
    }

    async fn fetch_bootstrap(&self) -> Result<CatalogSnapshot, BootstrapError> {
        let result = match self.try_fetch_bootstrap().await {
            Err(ProtectError::Status(StatusCode::UNAUTHORIZED) | ProtectError::NotLoggedIn) => {
                tracing::info!("controller session expired, logging in again");
                self.login().await.map_err(BootstrapError::Unauthenticated)?;
                self.try_fetch_bootstrap().await
            }
            other => other,
        };
        let bootstrap = result.map_err(ProtectError::into_bootstrap)?;

        if let Some(id) = bootstrap.last_update_id {
            self.remember_update_id(id);
        }
        tracing::debug!(
            cameras = bootstrap.snapshot.camera_count(),
            sensors = bootstrap.snapshot.sensor_count(),
            "fetched controller bootstrap"
        );
        Ok(bootstrap.snapshot)
    }

    async fn subscribe(&self) -> Result<mpsc::Receiver<EventPacket>, BridgeError> {
        let stream = self
            .connect_updates()
            .await
            .map_err(ProtectError::into_subscription)?;

        let (sender, receiver) = mpsc::channel(self.inner.config.channel_capacity.max(1));
        tokio::spawn(self.clone().listen(stream, sender));
        Ok(receiver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> ProtectSession {
        ProtectSession::new(ProtectConfig {
            url: "https://127.0.0.1:1".to_string(),
            username: "bridge".to_string(),
            password: "secret".to_string(),
            ..ProtectConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn should_capture_cookie_pair_and_csrf_token() {
        let mut headers = HeaderMap::new();
        headers.insert(
            SET_COOKIE,
            HeaderValue::from_static("TOKEN=abc.def; path=/; samesite=none; secure; httponly"),
        );
        headers.insert(CSRF_HEADER, HeaderValue::from_static("csrf-123"));

        let token = SessionToken::from_headers(&headers).unwrap();
        assert_eq!(token.cookie, "TOKEN=abc.def");
        assert_eq!(token.csrf.as_deref(), Some("csrf-123"));
    }

    #[test]
    fn should_accept_missing_csrf_token() {
        let mut headers = HeaderMap::new();
        headers.insert(SET_COOKIE, HeaderValue::from_static("TOKEN=abc"));
        let token = SessionToken::from_headers(&headers).unwrap();
        assert!(token.csrf.is_none());
    }

    #[test]
    fn should_reject_response_without_cookie() {
        assert!(SessionToken::from_headers(&HeaderMap::new()).is_none());

        let mut headers = HeaderMap::new();
        headers.insert(SET_COOKIE, HeaderValue::from_static("; path=/"));
        assert!(SessionToken::from_headers(&headers).is_none());
    }

    #[test]
    fn should_serialize_login_request_in_camel_case() {
        let body = serde_json::to_value(LoginRequest {
            username: "bridge",
            password: "secret",
            remember_me: true,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"username": "bridge", "password": "secret", "rememberMe": true})
        );
    }

    #[test]
    fn should_share_state_between_clones() {
        let session = session();
        let clone = session.clone();
        session.remember_update_id("u-1".to_string());
        session.set_token(Some(SessionToken {
            cookie: "TOKEN=abc".to_string(),
            csrf: None,
        }));
        assert_eq!(clone.last_update_id().as_deref(), Some("u-1"));
        assert!(clone.token().is_some());
    }

    #[tokio::test]
    async fn should_refuse_to_subscribe_before_login() {
        let err = session().subscribe().await.unwrap_err();
        assert!(matches!(err, BridgeError::Subscription(_)));
    }

    #[tokio::test]
    async fn should_report_unreachable_controller_as_transport_error() {
        let err = session().login().await.unwrap_err();
        assert!(matches!(err, AuthError::Transport(_)));
    }

    #[tokio::test]
    async fn should_try_to_log_in_when_fetching_without_session() {
        let err = session().fetch_bootstrap().await.unwrap_err();
        assert!(matches!(
            err,
            BootstrapError::Unauthenticated(AuthError::Transport(_))
        ));
    }
}
