//! End-to-end session behaviour against a stub Modcandy backend.

use modcandy_core::auth::MemoryTokenStore;
use modcandy_core::{
    ApiClient, ApiError, AuthError, Credentials, Navigation, Route, SessionController,
    SessionState,
};
use modcandy_core::models::IncidentFilter;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LOGIN_PATH: &str = "/account/api/auth/login";
const REGISTER_PATH: &str = "/account/api/auth/register";

fn controller(server: &MockServer, store: &MemoryTokenStore, location: Route) -> SessionController {
    let api = ApiClient::new(&server.uri()).unwrap();
    SessionController::new(api, Box::new(store.clone()), location)
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .and(body_json(json!({"username": "user@example.com", "password": "correct-pw"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "abc123",
            "expiry": "2025-01-01",
            "user": {"email": "user@example.com"}
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .and(body_json(json!({"username": "user@example.com", "password": "wrong-pw"})))
        .respond_with(ResponseTemplate::new(400))
        .mount(server)
        .await;
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_login_success_sets_and_persists_session() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    let store = MemoryTokenStore::new();
    let mut ctl = controller(&server, &store, Route::Landing);
    ctl.initialize();

    let nav = ctl
        .login(&Credentials::new("user@example.com", "correct-pw"))
        .await
        .unwrap();

    assert_eq!(nav, Navigation::Redirect(Route::Dashboard));
    assert_eq!(ctl.state(), SessionState::Authenticated);
    assert_eq!(ctl.token(), Some("abc123"));
    assert_eq!(store.peek().as_deref(), Some("abc123"));
}

#[tokio::test]
async fn test_login_wrong_password_leaves_session_unchanged() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    let store = MemoryTokenStore::new();
    let mut ctl = controller(&server, &store, Route::Landing);
    ctl.initialize();

    let err = ctl
        .login(&Credentials::new("user@example.com", "wrong-pw"))
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::InvalidCredentials));
    assert_eq!(ctl.state(), SessionState::Unauthenticated);
    assert_eq!(ctl.location(), &Route::Landing);
    assert_eq!(store.peek(), None);
}

#[tokio::test]
async fn test_login_failure_keeps_existing_session() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    let store = MemoryTokenStore::with_token("previous");
    let mut ctl = controller(&server, &store, Route::Settings);
    ctl.initialize();

    let err = ctl
        .login(&Credentials::new("user@example.com", "wrong-pw"))
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::InvalidCredentials));
    assert_eq!(ctl.token(), Some("previous"));
    assert_eq!(store.peek().as_deref(), Some("previous"));
}

#[tokio::test]
async fn test_login_is_sent_once_even_on_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;
    let mut ctl = controller(&server, &MemoryTokenStore::new(), Route::Landing);
    ctl.initialize();

    let err = ctl
        .login(&Credentials::new("user@example.com", "pw"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));
}

#[tokio::test]
async fn test_login_success_without_token_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"expiry": "2025-01-01"})))
        .mount(&server)
        .await;
    let store = MemoryTokenStore::new();
    let mut ctl = controller(&server, &store, Route::Landing);
    ctl.initialize();

    let err = ctl
        .login(&Credentials::new("user@example.com", "pw"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidResponse(_)));
    assert!(!ctl.is_authenticated());
}

#[tokio::test]
async fn test_login_unreachable_server_is_network_error() {
    // Nothing listens on the discard port
    let api = ApiClient::new("http://127.0.0.1:9").unwrap();
    let mut ctl = SessionController::new(api, Box::new(MemoryTokenStore::new()), Route::Landing);
    ctl.initialize();

    let err = ctl
        .login(&Credentials::new("user@example.com", "pw"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Network(_)));
    assert!(!ctl.is_authenticated());
}

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn test_register_success_authenticates() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(REGISTER_PATH))
        .and(body_json(json!({"email": "new@example.com", "password": "pw"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"token": "fresh"})))
        .mount(&server)
        .await;
    let store = MemoryTokenStore::new();
    let mut ctl = controller(&server, &store, Route::Landing);
    ctl.initialize();

    let nav = ctl
        .register_confirmed(&Credentials::new("new@example.com", "pw"), "pw")
        .await
        .unwrap();

    assert_eq!(nav, Navigation::Redirect(Route::Dashboard));
    assert_eq!(store.peek().as_deref(), Some("fresh"));
}

#[tokio::test]
async fn test_register_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(REGISTER_PATH))
        .respond_with(ResponseTemplate::new(409))
        .mount(&server)
        .await;
    let store = MemoryTokenStore::new();
    let mut ctl = controller(&server, &store, Route::Landing);
    ctl.initialize();

    let err = ctl
        .register(&Credentials::new("taken@example.com", "pw"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::RegistrationFailed));
    assert_eq!(store.peek(), None);
}

// ============================================================================
// Rehydration and guard
// ============================================================================

#[tokio::test]
async fn test_rehydration_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let store = MemoryTokenStore::with_token("abc123");
    let mut ctl = controller(&server, &store, Route::Landing);
    assert_eq!(ctl.initialize(), Navigation::Redirect(Route::Dashboard));
    assert_eq!(ctl.token(), Some("abc123"));
    assert_eq!(ctl.state(), SessionState::Authenticated);
}

#[tokio::test]
async fn test_login_then_logout_then_restart() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    let store = MemoryTokenStore::new();

    let mut ctl = controller(&server, &store, Route::Landing);
    ctl.initialize();
    ctl.login(&Credentials::new("user@example.com", "correct-pw"))
        .await
        .unwrap();
    assert_eq!(ctl.navigate(Route::Incidents), &Route::Incidents);

    assert_eq!(ctl.logout(), Navigation::Redirect(Route::Landing));

    let mut restarted = controller(&server, &store, Route::Incidents);
    assert_eq!(restarted.initialize(), Navigation::Redirect(Route::Landing));
    assert!(!restarted.is_authenticated());
}

// ============================================================================
// Authorized data requests
// ============================================================================

#[tokio::test]
async fn test_data_requests_send_token_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/analyzer/messages/recent"))
        .and(header("Authorization", "token abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
        .expect(1)
        .mount(&server)
        .await;

    let store = MemoryTokenStore::with_token("abc123");
    let mut ctl = controller(&server, &store, Route::Log);
    ctl.initialize();

    let messages = ctl.api().fetch_recent_messages().await.unwrap();
    assert_eq!(messages, json!([{"id": 1}]));
}

#[tokio::test]
async fn test_data_requests_without_session_fail_locally() {
    let server = MockServer::start().await;
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let api = ApiClient::new(&server.uri()).unwrap();
    let err = api.fetch_player_stats().await.unwrap_err();
    assert!(matches!(err, ApiError::NotAuthenticated));
}

#[tokio::test]
async fn test_incident_filters_become_query_params() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/analyzer/list/incidents"))
        .and(query_param("page", "2"))
        .and(query_param("severity", "high"))
        .and(query_param("playerName", "griefer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 41,
            "next": format!("{}/api/analyzer/list/incidents?page=3", server.uri()),
            "previous": format!("{}/api/analyzer/list/incidents?page=1", server.uri()),
            "results": [{"id": "i-1"}]
        })))
        .mount(&server)
        .await;

    let api = ApiClient::new(&server.uri())
        .unwrap()
        .with_token("abc123".to_string());
    let filter = IncidentFilter {
        page: Some(2),
        severity: Some("high".to_string()),
        player_name: Some("griefer".to_string()),
        ..Default::default()
    };

    let page = api.fetch_incidents(&filter).await.unwrap();
    assert_eq!(page.count, 41);
    assert_eq!(page.results.len(), 1);
    assert!(page.has_next());
}

#[tokio::test]
async fn test_follow_next_page_link() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/analyzer/list/incidents"))
        .and(query_param("page", "3"))
        .and(header("Authorization", "token abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 41,
            "next": null,
            "previous": format!("{}/api/analyzer/list/incidents?page=2", server.uri()),
            "results": [{"id": "i-40"}, {"id": "i-41"}]
        })))
        .mount(&server)
        .await;

    let api = ApiClient::new(&server.uri())
        .unwrap()
        .with_token("abc123".to_string());
    let link = format!("{}/api/analyzer/list/incidents?page=3", server.uri());

    let page = api.fetch_incidents_page(&link).await.unwrap();
    assert_eq!(page.results.len(), 2);
    assert!(!page.has_next());
    assert!(page.has_previous());
}

#[tokio::test]
async fn test_page_link_to_another_host_is_not_followed() {
    let server = MockServer::start().await;
    let elsewhere = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 0, "next": null, "previous": null, "results": []
        })))
        .expect(0)
        .mount(&elsewhere)
        .await;

    let api = ApiClient::new(&server.uri())
        .unwrap()
        .with_token("abc123".to_string());
    let link = format!("{}/api/analyzer/list/incidents?page=2", elsewhere.uri());

    let err = api.fetch_incidents_page(&link).await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidResponse(_)));
    // Dropping `elsewhere` verifies the expectation of zero requests
}

#[tokio::test]
async fn test_api_key_missing_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/account/api/key"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let api = ApiClient::new(&server.uri())
        .unwrap()
        .with_token("abc123".to_string());
    assert!(api.fetch_api_key().await.unwrap().is_none());
}

#[tokio::test]
async fn test_api_key_create_and_delete() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/account/api/key"))
        .and(header("Authorization", "token abc123"))
        .and(body_json(json!({"keyname": "bot"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"key": "mc_live_123"})))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/account/api/key"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let api = ApiClient::new(&server.uri())
        .unwrap()
        .with_token("abc123".to_string());
    let created = api.create_api_key("  bot ").await.unwrap();
    assert_eq!(created.key, "mc_live_123");
    api.delete_api_key().await.unwrap();
}

#[tokio::test]
async fn test_expired_token_surfaces_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/account/api/credit"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let api = ApiClient::new(&server.uri())
        .unwrap()
        .with_token("stale".to_string());
    assert!(matches!(api.fetch_credit().await, Err(ApiError::Unauthorized)));
}
