use super::*;
use crate::net::test_helpers::{MockTransport, client_with, credentials, ok, status, unauthorized};
use crate::state::session::{SessionEvent, SessionState};
use serde_json::json;

fn bearer_of(request: &HttpRequest) -> Option<&str> {
    request.bearer.as_deref()
}

// =============================================================================
// send
// =============================================================================

#[tokio::test]
async fn attaches_stored_access_token() {
    let transport = Arc::new(MockTransport::scripted(vec![ok(json!([]))]));
    let (client, _) = client_with(&transport, Some(credentials("a1", "r1")));

    client.send(HttpRequest::get("/appointments/me")).await.unwrap();

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(bearer_of(&requests[0]), Some("a1"));
}

#[tokio::test]
async fn sends_without_bearer_when_store_is_empty() {
    let transport = Arc::new(MockTransport::scripted(vec![ok(json!([]))]));
    let (client, _) = client_with(&transport, None);

    client.send(HttpRequest::get("/specialties")).await.unwrap();

    assert_eq!(bearer_of(&transport.requests()[0]), None);
}

#[tokio::test]
async fn refreshes_once_and_replays_with_new_token() {
    let transport = Arc::new(MockTransport::scripted(vec![
        unauthorized(),
        ok(json!({ "accessToken": "a2" })),
        ok(json!([{ "id": 1 }])),
    ]));
    let (client, store) = client_with(&transport, Some(credentials("a1", "r1")));

    let response = client.send(HttpRequest::get("/appointments/me")).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(transport.paths(), vec!["/appointments/me", REFRESH_PATH, "/appointments/me"]);
    let requests = transport.requests();
    assert_eq!(bearer_of(&requests[0]), Some("a1"));
    assert_eq!(bearer_of(&requests[1]), None);
    assert_eq!(requests[1].body, Some(json!({ "refreshToken": "r1" })));
    assert_eq!(bearer_of(&requests[2]), Some("a2"));
    assert_eq!(store.access_token().as_deref(), Some("a2"));
    assert_eq!(store.refresh_token().as_deref(), Some("r1"));
}

#[tokio::test]
async fn persists_rotated_refresh_token() {
    let transport = Arc::new(MockTransport::scripted(vec![
        unauthorized(),
        ok(json!({ "accessToken": "a2", "refreshToken": "r2" })),
        ok(json!(null)),
    ]));
    let (client, store) = client_with(&transport, Some(credentials("a1", "r1")));

    client.send(HttpRequest::get("/users/me")).await.unwrap();

    assert_eq!(store.refresh_token().as_deref(), Some("r2"));
}

#[tokio::test]
async fn unauthorized_without_refresh_token_skips_refresh() {
    let transport = Arc::new(MockTransport::scripted(vec![unauthorized()]));
    let (client, store) = client_with(&transport, None);
    store.save_access_token("a1").unwrap();

    let err = client.send(HttpRequest::get("/appointments/me")).await.unwrap_err();

    assert!(matches!(err, ClientError::Unauthorized(ref m) if m == "Token expired"));
    assert_eq!(transport.count(REFRESH_PATH), 0);
    assert_eq!(store.access_token().as_deref(), Some("a1"));
}

#[tokio::test]
async fn second_unauthorized_after_replay_is_not_refreshed_again() {
    let transport = Arc::new(MockTransport::scripted(vec![
        unauthorized(),
        ok(json!({ "accessToken": "a2" })),
        unauthorized(),
    ]));
    let (client, _) = client_with(&transport, Some(credentials("a1", "r1")));

    let err = client.send(HttpRequest::get("/appointments/me")).await.unwrap_err();

    assert!(matches!(err, ClientError::Unauthorized(_)));
    assert_eq!(transport.count(REFRESH_PATH), 1);
    assert_eq!(transport.requests().len(), 3);
}

#[tokio::test]
async fn refresh_failure_tears_session_down() {
    let transport = Arc::new(MockTransport::scripted(vec![
        unauthorized(),
        status(401, json!({ "success": false, "error": { "code": "INVALID_TOKEN", "message": "Refresh token revoked" } })),
    ]));
    let (client, store) = client_with(&transport, Some(credentials("a1", "r1")));
    client.session().begin_check();
    client.session().finish_check(Some(crate::net::test_helpers::user("u1")));
    let mut events = client.session().events();

    let err = client.send(HttpRequest::get("/appointments/me")).await.unwrap_err();

    assert!(matches!(err, ClientError::RefreshFailed(_)));
    assert_eq!(err.user_message(), "Refresh token revoked");
    assert!(store.access_token().is_none());
    assert!(store.refresh_token().is_none());
    assert_eq!(client.session().state(), SessionState::Anonymous);
    assert_eq!(events.try_recv().unwrap(), SessionEvent::Expired);
    assert_eq!(transport.requests().len(), 2);
}

#[tokio::test]
async fn refresh_failure_before_startup_check_settles_anonymous() {
    let transport = Arc::new(MockTransport::scripted(vec![
        unauthorized(),
        status(401, json!({ "success": false, "error": { "code": "INVALID_TOKEN", "message": "Refresh token revoked" } })),
    ]));
    let (client, store) = client_with(&transport, Some(credentials("a1", "r1")));
    assert_eq!(client.session().state(), SessionState::Uninitialized);
    let mut events = client.session().events();

    let err = client.send(HttpRequest::get("/specialties")).await.unwrap_err();

    assert!(matches!(err, ClientError::RefreshFailed(_)));
    assert!(store.access_token().is_none());
    assert_eq!(client.session().state(), SessionState::Anonymous);
    assert!(!client.session().state().is_loading());
    assert_eq!(events.try_recv().unwrap(), SessionEvent::Expired);
    // A settled session is not re-checked.
    assert!(!client.session().begin_check());
}

#[tokio::test]
async fn refresh_transport_error_is_wrapped() {
    let transport = Arc::new(MockTransport::scripted(vec![unauthorized(), Err(ClientError::Timeout)]));
    let (client, store) = client_with(&transport, Some(credentials("a1", "r1")));

    let err = client.send(HttpRequest::get("/appointments/me")).await.unwrap_err();

    match err {
        ClientError::RefreshFailed(inner) => assert!(matches!(*inner, ClientError::Timeout)),
        other => panic!("expected RefreshFailed, got {other:?}"),
    }
    assert!(store.refresh_token().is_none());
}

#[tokio::test]
async fn non_401_errors_pass_through_unchanged() {
    let transport = Arc::new(MockTransport::scripted(vec![status(
        404,
        json!({ "success": false, "error": { "code": "NOT_FOUND", "message": "Không tìm thấy" } }),
    )]));
    let (client, store) = client_with(&transport, Some(credentials("a1", "r1")));

    let err = client.send(HttpRequest::get("/doctors/x")).await.unwrap_err();

    assert!(matches!(
        err,
        ClientError::Server { status: 404, ref code, ref message }
            if code.as_deref() == Some("NOT_FOUND") && message == "Không tìm thấy"
    ));
    assert_eq!(store.access_token().as_deref(), Some("a1"));
    assert_eq!(transport.count(REFRESH_PATH), 0);
}

#[tokio::test]
async fn transport_errors_are_not_retried() {
    let transport = Arc::new(MockTransport::scripted(vec![Err(ClientError::Network("connection refused".into()))]));
    let (client, _) = client_with(&transport, Some(credentials("a1", "r1")));

    let err = client.send(HttpRequest::get("/specialties")).await.unwrap_err();

    assert!(matches!(err, ClientError::Network(_)));
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn concurrent_unauthorized_requests_share_one_refresh() {
    let transport = Arc::new(MockTransport::routed(|request| {
        if request.path == REFRESH_PATH {
            return ok(json!({ "accessToken": "a2" }));
        }
        match request.bearer.as_deref() {
            Some("a2") => ok(json!([])),
            _ => unauthorized(),
        }
    }));
    let (client, _) = client_with(&transport, Some(credentials("a1", "r1")));

    let (first, second) = tokio::join!(
        client.send(HttpRequest::get("/appointments/me")),
        client.send(HttpRequest::get("/medical-records/me")),
    );

    assert!(first.is_ok());
    assert!(second.is_ok());
    assert_eq!(transport.count(REFRESH_PATH), 1);
}

// =============================================================================
// send_public
// =============================================================================

#[tokio::test]
async fn send_public_omits_bearer_and_never_refreshes() {
    let transport = Arc::new(MockTransport::scripted(vec![unauthorized()]));
    let (client, store) = client_with(&transport, Some(credentials("a1", "r1")));

    let err = client.send_public(HttpRequest::post("/auth/login")).await.unwrap_err();

    assert!(matches!(err, ClientError::Unauthorized(_)));
    assert_eq!(bearer_of(&transport.requests()[0]), None);
    assert_eq!(transport.requests().len(), 1);
    assert_eq!(store.refresh_token().as_deref(), Some("r1"));
}

// =============================================================================
// envelope decoding
// =============================================================================

#[tokio::test]
async fn get_json_accepts_result_alias() {
    let transport = Arc::new(MockTransport::scripted(vec![status(
        200,
        json!({ "code": 1000, "message": "ok", "result": { "value": 7 } }),
    )]));
    let (client, _) = client_with(&transport, None);

    let value: serde_json::Value = client.get_json("/anything").await.unwrap();

    assert_eq!(value, json!({ "value": 7 }));
}

#[tokio::test]
async fn request_or_default_treats_missing_payload_as_empty() {
    let transport = Arc::new(MockTransport::scripted(vec![status(200, json!({ "success": true }))]));
    let (client, _) = client_with(&transport, None);

    let list: Vec<serde_json::Value> = client.request_or_default(HttpRequest::get("/medicines")).await.unwrap();

    assert!(list.is_empty());
}

#[tokio::test]
async fn get_json_rejects_missing_payload() {
    let transport = Arc::new(MockTransport::scripted(vec![status(200, json!({ "success": true }))]));
    let (client, _) = client_with(&transport, None);

    let err = client.get_json::<serde_json::Value>("/doctors/1").await.unwrap_err();

    assert!(matches!(err, ClientError::Decode(_)));
}

#[test]
fn unsuccessful_envelope_with_2xx_is_server_error() {
    let response = HttpResponse::new(
        200,
        json!({ "success": false, "error": { "code": "SLOT_TAKEN", "message": "Khung giờ đã đầy" } }).to_string(),
    );

    let err = decode_envelope::<serde_json::Value>(&response).unwrap_err();

    assert!(matches!(
        err,
        ClientError::Server { status: 200, ref code, ref message }
            if code.as_deref() == Some("SLOT_TAKEN") && message == "Khung giờ đã đầy"
    ));
}

#[test]
fn error_from_response_reads_top_level_code_and_message() {
    let response = HttpResponse::new(400, json!({ "code": 1002, "message": "Email đã tồn tại" }).to_string());

    let err = error_from_response(&response);

    assert!(matches!(
        err,
        ClientError::Server { status: 400, ref code, ref message }
            if code.as_deref() == Some("1002") && message == "Email đã tồn tại"
    ));
}

#[test]
fn error_from_response_falls_back_to_status_text() {
    let err = error_from_response(&HttpResponse::new(502, "<html>bad gateway</html>"));

    assert!(matches!(err, ClientError::Server { status: 502, code: None, ref message } if message == "HTTP 502"));
}

#[test]
fn error_from_response_maps_401_to_unauthorized() {
    let err = error_from_response(&HttpResponse::new(401, ""));
    assert!(matches!(err, ClientError::Unauthorized(ref m) if m == "HTTP 401"));
}

#[tokio::test]
async fn delete_ignores_payload() {
    let transport = Arc::new(MockTransport::scripted(vec![status(204, json!(null))]));
    let (client, _) = client_with(&transport, Some(credentials("a1", "r1")));

    client.delete("/specialties/sp-1").await.unwrap();

    let request = &transport.requests()[0];
    assert_eq!(request.method, reqwest::Method::DELETE);
    assert_eq!(request.bearer.as_deref(), Some("a1"));
}
