//! Session store: process-wide authentication state.
//!
//! ARCHITECTURE
//! ============
//! `SessionHandle` owns the state cell (a `watch` channel, so every consumer
//! reads the latest value) and the event stream (`broadcast`). The HTTP
//! client holds a clone so a failed token refresh can tear the session down;
//! `SessionStore` drives the remaining transitions.
//!
//! STATE MACHINE
//! =============
//! `Uninitialized -> Loading -> {Authenticated, Anonymous}`,
//! `Authenticated -> Anonymous` (logout), any state `-> Anonymous` (refresh
//! failure),
//! `Anonymous -> Authenticated` (login). Settled sessions are never
//! re-checked. Transitions are applied with `send_if_modified`, so a check
//! that finishes after a concurrent login cannot overwrite it.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::sync::Arc;

use tokio::sync::{broadcast, watch};

use crate::error::ClientError;
use crate::net::api;
use crate::net::client::ApiClient;
use crate::net::types::{LoginRequest, User};
use crate::util::validate;

const EVENT_CAPACITY: usize = 16;

/// Authentication state visible to the UI tree.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionState {
    Uninitialized,
    Loading,
    Authenticated(User),
    Anonymous,
}

impl SessionState {
    #[must_use]
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    /// True until the startup check settles.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Uninitialized | Self::Loading)
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Loading => "loading",
            Self::Authenticated(_) => "authenticated",
            Self::Anonymous => "anonymous",
        }
    }
}

/// Notable session changes, for shells that navigate on them.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    SignedIn(User),
    SignedOut,
    /// Credentials were revoked by a failed refresh; route to the login page.
    Expired,
}

// =============================================================================
// HANDLE
// =============================================================================

struct SessionShared {
    state: watch::Sender<SessionState>,
    events: broadcast::Sender<SessionEvent>,
}

/// Shared state cell for one session. Cloning shares the cell.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<SessionShared>,
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle").field("state", &self.state().name()).finish()
    }
}

impl SessionHandle {
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { inner: Arc::new(SessionShared { state: watch::Sender::new(SessionState::Uninitialized), events }) }
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    /// Receiver that observes every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    #[must_use]
    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    fn transition(&self, label: &'static str, apply: impl FnOnce(&SessionState) -> Option<SessionState>) -> bool {
        self.inner.state.send_if_modified(|state| match apply(state) {
            Some(next) => {
                tracing::debug!(transition = label, from = state.name(), to = next.name(), "session transition");
                *state = next;
                true
            }
            None => {
                tracing::debug!(transition = label, state = state.name(), "session transition skipped");
                false
            }
        })
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.inner.events.send(event);
    }

    pub(crate) fn begin_check(&self) -> bool {
        self.transition("begin_check", |state| {
            matches!(state, SessionState::Uninitialized).then_some(SessionState::Loading)
        })
    }

    pub(crate) fn finish_check(&self, user: Option<User>) -> bool {
        let signed_in = user.clone();
        let applied = self.transition("finish_check", |state| {
            matches!(state, SessionState::Loading)
                .then(|| user.map_or(SessionState::Anonymous, SessionState::Authenticated))
        });
        if !applied {
            tracing::warn!(state = self.state().name(), "session check result discarded; state already settled");
        } else if let Some(user) = signed_in {
            self.emit(SessionEvent::SignedIn(user));
        }
        applied
    }

    pub(crate) fn sign_in(&self, user: User) -> bool {
        let applied = self.transition("sign_in", |state| {
            (!state.is_authenticated()).then(|| SessionState::Authenticated(user.clone()))
        });
        if applied {
            self.emit(SessionEvent::SignedIn(user));
        } else {
            tracing::warn!(user_id = %user.id, "sign-in rejected; another user is signed in");
        }
        applied
    }

    pub(crate) fn sign_out(&self) -> bool {
        let applied = self.transition("sign_out", |state| {
            (!matches!(state, SessionState::Anonymous)).then_some(SessionState::Anonymous)
        });
        if applied {
            self.emit(SessionEvent::SignedOut);
        }
        applied
    }

    /// Drop the user after the HTTP layer revoked the credentials. Settles
    /// the session from any state, including before the startup check ran.
    pub(crate) fn expire(&self) {
        self.transition("expire", |state| {
            (!matches!(state, SessionState::Anonymous)).then_some(SessionState::Anonymous)
        });
        self.emit(SessionEvent::Expired);
    }
}

// =============================================================================
// STORE
// =============================================================================

/// Single-instance authentication state, writable only through its operations.
pub struct SessionStore {
    client: Arc<ApiClient>,
}

impl SessionStore {
    #[must_use]
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    #[must_use]
    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    fn handle(&self) -> &SessionHandle {
        self.client.session()
    }

    /// Restore the session from stored tokens. Runs once; later calls return
    /// immediately. Any failure settles as anonymous and clears the tokens.
    pub async fn check_auth(&self) {
        let session = self.handle();
        if !session.begin_check() {
            return;
        }

        if self.client.tokens().access_token().is_none() {
            tracing::debug!("no stored access token; session is anonymous");
            session.finish_check(None);
            return;
        }

        match api::current_user(&self.client).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, role = ?user.role, "session restored");
                session.finish_check(Some(user));
            }
            Err(e) => {
                tracing::warn!(error = %e, code = e.error_code(), "session check failed; signing out");
                if matches!(session.state(), SessionState::Loading)
                    && let Err(e) = self.client.tokens().clear()
                {
                    tracing::warn!(error = %e, "failed to clear stored tokens");
                }
                session.finish_check(None);
            }
        }
    }

    /// Sign in, persisting both tokens before the user becomes visible.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Validation`] for malformed credentials (no request is sent).
    /// - [`ClientError::Auth`] if the server rejects the credentials or a session is
    ///   already signed in.
    /// - Transport, server and storage errors unchanged. The state is left as it was.
    pub async fn login(&self, credentials: &LoginRequest) -> Result<User, ClientError> {
        if self.is_authenticated() {
            return Err(ClientError::Auth("already signed in".to_owned()));
        }
        validate::validate_login(credentials)?;

        let response = api::login(&self.client, credentials).await?;
        let tokens = self.client.tokens();
        if let Err(e) = tokens.save_credentials(&response.credentials()) {
            if let Err(clear_err) = tokens.clear() {
                tracing::warn!(error = %clear_err, "failed to roll back partial credentials");
            }
            return Err(e);
        }

        tracing::info!(user_id = %response.user.id, role = ?response.user.role, "signed in");
        self.handle().sign_in(response.user.clone());
        Ok(response.user)
    }

    /// Clear local state and stored tokens. No server round-trip.
    pub fn logout(&self) {
        if let Err(e) = self.client.tokens().clear() {
            tracing::warn!(error = %e, "failed to clear stored tokens");
        }
        if self.handle().sign_out() {
            tracing::info!("signed out");
        }
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.handle().state()
    }

    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.state().user().cloned()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state().is_authenticated()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state().is_loading()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.handle().subscribe()
    }

    #[must_use]
    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.handle().events()
    }
}
