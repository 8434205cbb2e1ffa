//! Authenticated API client.
//!
//! ARCHITECTURE
//! ============
//! Every server call flows through `ApiClient::send`, a middleware loop
//! around the base `Transport`:
//!
//! 1. attach the *currently stored* access token as a bearer credential,
//! 2. dispatch,
//! 3. classify the reply as done, retry-needed or failed.
//!
//! A 401 on a request that has not been replayed triggers one out-of-band
//! refresh (straight to the transport, never through this loop) and one
//! replay. The per-request `retried` marker bounds the loop to two
//! dispatches. A failed refresh clears both tokens, expires the session and
//! surfaces the refresh error.
//!
//! CONCURRENCY
//! ===========
//! Refreshes are single-flight: the refresh gate is an async mutex, and a
//! request that acquires it after another request already rotated the token
//! replays with the rotated token instead of refreshing again.

#[cfg(test)]
#[path = "client_test.rs"]
mod client_test;

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
use super::types::{ApiEnvelope, Credentials, RefreshRequest, RefreshResponse};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::state::session::SessionHandle;
use crate::state::tokens::TokenStore;

pub const REFRESH_PATH: &str = "/auth/refresh";

/// A request plus its one-shot replay marker.
struct RequestEnvelope {
    id: Uuid,
    request: HttpRequest,
    retried: bool,
}

enum Outcome {
    Done(HttpResponse),
    Retry,
    Failed(ClientError),
}

pub struct ApiClient {
    transport: Arc<dyn Transport>,
    tokens: Arc<dyn TokenStore>,
    session: SessionHandle,
    refresh_gate: Mutex<()>,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>, tokens: Arc<dyn TokenStore>) -> Self {
        Self { transport, tokens, session: SessionHandle::new(), refresh_gate: Mutex::new(()) }
    }

    /// Client over a `ReqwestTransport` built from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::HttpClientBuild`] if the HTTP client cannot be built.
    pub fn from_config(config: ClientConfig, tokens: Arc<dyn TokenStore>) -> Result<Self, ClientError> {
        let transport = ReqwestTransport::new(config)?;
        Ok(Self::new(Arc::new(transport), tokens))
    }

    #[must_use]
    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    #[must_use]
    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    // =========================================================================
    // DISPATCH
    // =========================================================================

    /// Send an authenticated request, refreshing the access token once on 401.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Network`] / [`ClientError::Timeout`] from the transport.
    /// - [`ClientError::Unauthorized`] on 401 when no refresh is possible, or when
    ///   the replay is rejected again.
    /// - [`ClientError::RefreshFailed`] when the refresh call fails; the session
    ///   has been torn down by then.
    /// - [`ClientError::Server`] for any other non-2xx status.
    pub async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ClientError> {
        let mut envelope = RequestEnvelope { id: Uuid::new_v4(), request, retried: false };
        loop {
            envelope.request.bearer = self.tokens.access_token();
            tracing::debug!(
                request_id = %envelope.id,
                method = %envelope.request.method,
                path = %envelope.request.path,
                authorized = envelope.request.bearer.is_some(),
                retried = envelope.retried,
                "dispatch"
            );
            let response = self.transport.dispatch(&envelope.request).await?;
            match self.classify(&mut envelope, response).await {
                Outcome::Done(response) => return Ok(response),
                Outcome::Retry => {}
                Outcome::Failed(e) => return Err(e),
            }
        }
    }

    /// Send without credentials and without the refresh interceptor.
    ///
    /// # Errors
    ///
    /// Transport errors, [`ClientError::Unauthorized`] on 401 and
    /// [`ClientError::Server`] on any other non-2xx status.
    pub async fn send_public(&self, mut request: HttpRequest) -> Result<HttpResponse, ClientError> {
        request.bearer = None;
        tracing::debug!(method = %request.method, path = %request.path, "dispatch public");
        let response = self.transport.dispatch(&request).await?;
        if response.is_success() { Ok(response) } else { Err(error_from_response(&response)) }
    }

    async fn classify(&self, envelope: &mut RequestEnvelope, response: HttpResponse) -> Outcome {
        if response.is_success() {
            return Outcome::Done(response);
        }
        if response.status != 401 {
            return Outcome::Failed(error_from_response(&response));
        }
        if envelope.retried {
            tracing::debug!(request_id = %envelope.id, "replay rejected again");
            return Outcome::Failed(error_from_response(&response));
        }
        envelope.retried = true;
        self.recover(envelope, &response).await
    }

    async fn recover(&self, envelope: &RequestEnvelope, response: &HttpResponse) -> Outcome {
        if self.tokens.refresh_token().is_none() {
            return Outcome::Failed(error_from_response(response));
        }

        let _gate = self.refresh_gate.lock().await;

        let current = self.tokens.access_token();
        if current.is_some() && current != envelope.request.bearer {
            tracing::debug!(request_id = %envelope.id, "access token already rotated; replaying");
            return Outcome::Retry;
        }
        let Some(refresh_token) = self.tokens.refresh_token() else {
            return Outcome::Failed(error_from_response(response));
        };

        match self.refresh(&refresh_token).await {
            Ok(()) => {
                tracing::debug!(request_id = %envelope.id, "access token refreshed; replaying");
                Outcome::Retry
            }
            Err(e) => {
                tracing::warn!(request_id = %envelope.id, error = %e, "token refresh failed; ending session");
                self.teardown();
                Outcome::Failed(ClientError::RefreshFailed(Box::new(e)))
            }
        }
    }

    async fn refresh(&self, refresh_token: &str) -> Result<(), ClientError> {
        let request = HttpRequest::post(REFRESH_PATH).json(&RefreshRequest { refresh_token: refresh_token.to_owned() })?;
        let response = self.transport.dispatch(&request).await?;
        if !response.is_success() {
            return Err(error_from_response(&response));
        }
        let payload: RefreshResponse = decode_envelope(&response)?;
        match payload.refresh_token {
            Some(rotated) => self
                .tokens
                .save_credentials(&Credentials { access_token: payload.access_token, refresh_token: rotated }),
            None => self.tokens.save_access_token(&payload.access_token),
        }
    }

    fn teardown(&self) {
        if let Err(e) = self.tokens.clear() {
            tracing::warn!(error = %e, "failed to clear stored tokens");
        }
        self.session.expire();
    }

    // =========================================================================
    // TYPED HELPERS
    // =========================================================================

    /// Send and decode the envelope payload.
    ///
    /// # Errors
    ///
    /// Everything [`ApiClient::send`] returns, plus [`ClientError::Decode`] and
    /// [`ClientError::Server`] for `success: false` envelopes.
    pub async fn request_json<T: DeserializeOwned>(&self, request: HttpRequest) -> Result<T, ClientError> {
        let response = self.send(request).await?;
        decode_envelope(&response)
    }

    /// Like [`ApiClient::request_json`], but a missing payload decodes as `T::default()`.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request_json`].
    pub async fn request_or_default<T: DeserializeOwned + Default>(&self, request: HttpRequest) -> Result<T, ClientError> {
        let response = self.send(request).await?;
        decode_envelope_or_default(&response)
    }

    /// `GET path` decoded as `T`.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request_json`].
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.request_json(HttpRequest::get(path)).await
    }

    /// `POST path` with a JSON body, decoded as `T`.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request_json`].
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ClientError> {
        self.request_json(HttpRequest::post(path).json(body)?).await
    }

    /// `PUT path` with a JSON body, decoded as `T`.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request_json`].
    pub async fn put_json<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ClientError> {
        self.request_json(HttpRequest::put(path).json(body)?).await
    }

    /// `DELETE path`, ignoring any payload.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn delete(&self, path: &str) -> Result<(), ClientError> {
        self.send(HttpRequest::delete(path)).await.map(|_| ())
    }
}

// =============================================================================
// DECODING
// =============================================================================

fn parse_envelope<T: DeserializeOwned>(response: &HttpResponse) -> Result<ApiEnvelope<T>, ClientError> {
    let envelope: ApiEnvelope<T> = response.json()?;
    if envelope.success {
        return Ok(envelope);
    }
    let (code, message) = match envelope.error {
        Some(error) => (Some(error.code), error.message),
        None => (None, envelope.message.unwrap_or_default()),
    };
    Err(ClientError::Server { status: response.status, code, message })
}

/// Payload of a successful envelope.
///
/// # Errors
///
/// [`ClientError::Decode`] for malformed bodies or a missing payload,
/// [`ClientError::Server`] for `success: false`.
pub fn decode_envelope<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ClientError> {
    parse_envelope(response)?
        .data
        .ok_or_else(|| ClientError::Decode("response envelope has no payload".to_owned()))
}

/// Payload of a successful envelope, or `T::default()` when absent.
///
/// # Errors
///
/// See [`decode_envelope`].
pub fn decode_envelope_or_default<T: DeserializeOwned + Default>(response: &HttpResponse) -> Result<T, ClientError> {
    Ok(parse_envelope(response)?.data.unwrap_or_default())
}

/// Map a non-2xx reply to the error taxonomy, keeping the server's message.
#[must_use]
pub fn error_from_response(response: &HttpResponse) -> ClientError {
    let (code, message) = parse_error_body(&response.body);
    let message = message.unwrap_or_else(|| format!("HTTP {}", response.status));
    if response.status == 401 {
        ClientError::Unauthorized(message)
    } else {
        ClientError::Server { status: response.status, code, message }
    }
}

fn parse_error_body(body: &str) -> (Option<String>, Option<String>) {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return (None, None);
    };
    let source = value.get("error").filter(|e| e.is_object()).unwrap_or(&value);
    let code = source.get("code").and_then(|c| match c {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    });
    let message = source
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.trim().is_empty())
        .map(ToOwned::to_owned);
    (code, message)
}
