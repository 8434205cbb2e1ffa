//! # clinic-client
//!
//! Client library for the clinic appointment service: an authenticated HTTP
//! client that renews expired access tokens, the session store built on it,
//! typed endpoint functions, and the booking/schedule/dashboard models that
//! pages render.
//!
//! ```no_run
//! use std::sync::Arc;
//! use clinic_client::{ApiClient, ClientConfig, LoginRequest, MemoryTokenStore, SessionStore};
//!
//! # async fn run() -> Result<(), clinic_client::ClientError> {
//! let client = Arc::new(ApiClient::from_config(ClientConfig::from_env()?, Arc::new(MemoryTokenStore::new()))?);
//! let session = SessionStore::new(client);
//! session.check_auth().await;
//! if !session.is_authenticated() {
//!     session.login(&LoginRequest::new("bs.lan@clinic.vn", "secret1")).await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod net;
pub mod state;
pub mod util;

pub use config::ClientConfig;
pub use error::ClientError;
pub use net::client::ApiClient;
pub use net::transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
pub use net::types::*;
pub use net::api;
pub use reqwest::Method;
pub use state::session::{SessionEvent, SessionHandle, SessionState, SessionStore};
pub use state::tokens::{FileTokenStore, MemoryTokenStore, TokenStore};
