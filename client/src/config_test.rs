use super::*;

/// # Safety
/// Tests touching the process environment share these variables; keep them in
/// this one test so parallel test threads cannot interleave.
unsafe fn clear_client_env() {
    unsafe {
        std::env::remove_var("CLINIC_API_URL");
        std::env::remove_var("CLINIC_API_TIMEOUT_SECS");
        std::env::remove_var("CLINIC_API_CONNECT_TIMEOUT_SECS");
    }
}

#[test]
fn from_env_defaults_then_overrides() {
    unsafe { clear_client_env() };

    let cfg = ClientConfig::from_env().unwrap();
    assert_eq!(cfg, ClientConfig::default());
    assert_eq!(cfg.timeout, Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS));

    unsafe {
        std::env::set_var("CLINIC_API_URL", "https://clinic.example.test/api/");
        std::env::set_var("CLINIC_API_TIMEOUT_SECS", "5");
        std::env::set_var("CLINIC_API_CONNECT_TIMEOUT_SECS", "not-a-number");
    }

    let cfg = ClientConfig::from_env().unwrap();
    assert_eq!(cfg.base_url, "https://clinic.example.test/api");
    assert_eq!(cfg.timeout, Duration::from_secs(5));
    assert_eq!(cfg.connect_timeout, Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS));

    unsafe { std::env::set_var("CLINIC_API_URL", "/api") };
    assert!(matches!(ClientConfig::from_env(), Err(ClientError::Config(_))));

    unsafe { clear_client_env() };
}

#[test]
fn normalize_base_url_trims_trailing_slashes() {
    assert_eq!(normalize_base_url("http://localhost:8080/api//").unwrap(), "http://localhost:8080/api");
}

#[test]
fn normalize_base_url_rejects_relative() {
    assert!(normalize_base_url("api").is_err());
}

#[test]
fn with_base_url_validates() {
    let cfg = ClientConfig::default().with_base_url("http://10.0.0.2:9000/").unwrap();
    assert_eq!(cfg.base_url, "http://10.0.0.2:9000");
    assert!(ClientConfig::default().with_base_url("ftp://x").is_err());
}

#[test]
fn url_for_joins_with_single_slash() {
    let cfg = ClientConfig::default();
    assert_eq!(cfg.url_for("/auth/me"), "http://127.0.0.1:8080/api/auth/me");
    assert_eq!(cfg.url_for("auth/me"), "http://127.0.0.1:8080/api/auth/me");
}
