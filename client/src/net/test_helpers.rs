//! In-process `Transport` double shared by unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde_json::{Value, json};

use super::client::ApiClient;
use super::transport::{HttpRequest, HttpResponse, Transport};
use super::types::{Credentials, User, UserRole};
use crate::error::ClientError;
use crate::state::tokens::{MemoryTokenStore, TokenStore};

type Responder = Box<dyn Fn(&HttpRequest) -> Result<HttpResponse, ClientError> + Send + Sync>;

/// Replies from a scripted queue first, then from the responder.
pub(crate) struct MockTransport {
    replies: Mutex<VecDeque<Result<HttpResponse, ClientError>>>,
    responder: Option<Responder>,
    log: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub(crate) fn scripted(replies: Vec<Result<HttpResponse, ClientError>>) -> Self {
        Self { replies: Mutex::new(replies.into()), responder: None, log: Mutex::new(Vec::new()) }
    }

    pub(crate) fn routed(
        responder: impl Fn(&HttpRequest) -> Result<HttpResponse, ClientError> + Send + Sync + 'static,
    ) -> Self {
        Self { replies: Mutex::new(VecDeque::new()), responder: Some(Box::new(responder)), log: Mutex::new(Vec::new()) }
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.log.lock().unwrap().clone()
    }

    pub(crate) fn paths(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.path).collect()
    }

    pub(crate) fn count(&self, path: &str) -> usize {
        self.requests().iter().filter(|r| r.path == path).count()
    }
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    async fn dispatch(&self, request: &HttpRequest) -> Result<HttpResponse, ClientError> {
        self.log.lock().unwrap().push(request.clone());
        // Let concurrent callers interleave at the I/O boundary.
        tokio::task::yield_now().await;
        let scripted = self.replies.lock().unwrap().pop_front();
        match (scripted, &self.responder) {
            (Some(reply), _) => reply,
            (None, Some(responder)) => responder(request),
            (None, None) => Err(ClientError::Network(format!("no scripted reply for {}", request.path))),
        }
    }
}

pub(crate) fn ok(data: Value) -> Result<HttpResponse, ClientError> {
    Ok(HttpResponse::new(200, json!({ "success": true, "data": data }).to_string()))
}

pub(crate) fn status(code: u16, body: Value) -> Result<HttpResponse, ClientError> {
    Ok(HttpResponse::new(code, body.to_string()))
}

pub(crate) fn unauthorized() -> Result<HttpResponse, ClientError> {
    status(401, json!({ "success": false, "error": { "code": "UNAUTHORIZED", "message": "Token expired" } }))
}

pub(crate) fn user_json(id: &str) -> Value {
    json!({ "id": id, "email": format!("{id}@clinic.vn"), "fullName": "Nguyễn Văn A", "role": "PATIENT" })
}

pub(crate) fn user(id: &str) -> User {
    User {
        id: id.to_owned(),
        email: format!("{id}@clinic.vn"),
        full_name: Some("Nguyễn Văn A".to_owned()),
        role: UserRole::Patient,
        avatar_url: None,
        doctor_id: None,
        patient_id: None,
    }
}

pub(crate) fn credentials(access: &str, refresh: &str) -> Credentials {
    Credentials { access_token: access.to_owned(), refresh_token: refresh.to_owned() }
}

/// Client over `transport` with the given stored tokens.
pub(crate) fn client_with(transport: &Arc<MockTransport>, tokens: Option<Credentials>) -> (Arc<ApiClient>, Arc<MemoryTokenStore>) {
    let store = Arc::new(tokens.map_or_else(MemoryTokenStore::new, |c| MemoryTokenStore::with_credentials(&c)));
    let dyn_transport: Arc<dyn Transport> = transport.clone();
    let dyn_store: Arc<dyn TokenStore> = store.clone();
    (Arc::new(ApiClient::new(dyn_transport, dyn_store)), store)
}
