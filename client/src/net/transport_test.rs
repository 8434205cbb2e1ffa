use super::*;
use serde_json::json;

// =============================================================================
// HttpRequest builders
// =============================================================================

#[test]
fn query_skips_none_values() {
    let req = HttpRequest::get("/doctors").query("specialtyId", Some("s1")).query("search", None::<&str>);
    assert_eq!(req.query, vec![("specialtyId".to_owned(), "s1".to_owned())]);
}

#[test]
fn json_attaches_body() {
    let req = HttpRequest::post("/auth/login").json(&json!({ "email": "a@b.vn" })).unwrap();
    assert_eq!(req.method, Method::POST);
    assert_eq!(req.body, Some(json!({ "email": "a@b.vn" })));
    assert!(req.bearer.is_none());
}

// =============================================================================
// HttpResponse
// =============================================================================

#[test]
fn success_range_is_2xx() {
    assert!(HttpResponse::new(200, "").is_success());
    assert!(HttpResponse::new(204, "").is_success());
    assert!(!HttpResponse::new(301, "").is_success());
    assert!(!HttpResponse::new(401, "").is_success());
}

#[test]
fn json_decode_error_is_decode_variant() {
    let resp = HttpResponse::new(200, "<html>");
    assert!(matches!(resp.json::<serde_json::Value>(), Err(ClientError::Decode(_))));
}

// =============================================================================
// ReqwestTransport
// =============================================================================

#[tokio::test]
async fn unreachable_host_is_network_error() {
    let config = ClientConfig::default()
        .with_base_url("http://127.0.0.1:9")
        .unwrap()
        .with_timeout(std::time::Duration::from_secs(2));
    let transport = ReqwestTransport::new(config).unwrap();
    let result = transport.dispatch(&HttpRequest::get("/auth/me")).await;
    assert!(matches!(result, Err(ClientError::Network(_) | ClientError::Timeout)));
}
