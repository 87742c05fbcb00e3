//! OAuth round-trip tests against a mock provider.
//!
//! `wiremock` stands in for the provider's token and userinfo endpoints;
//! the initiate redirect and the callback run through the real router with
//! a cookie jar, so the CSRF state round-trips through the session exactly
//! as in production.

use axum_test::TestServer;
use sea_orm::{ConnectionTrait, Database, DbBackend, EntityTrait, Statement};
use secret_sharer::AppResources;
use secret_sharer::api::{ServerState, build_router};
use secret_sharer::auth::identity::IdentityResolver;
use secret_sharer::auth::oauth::{OAuthFlow, ProviderConfig};
use secret_sharer::auth::store::CredentialStore;
use secret_sharer::config::{AppConfig, ProviderCredentials, SessionConfig};
use secret_sharer::entity::provider_identity::Provider;
use secret_sharer::entity::user;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".into(),
        listen_addr: "127.0.0.1:0".into(),
        public_url: "http://localhost:3000".into(),
        session: SessionConfig::default(),
        google: ProviderCredentials {
            client_id: "google-client".into(),
            client_secret: "google-secret".into(),
            callback_url: None,
        },
        facebook: ProviderCredentials {
            client_id: "facebook-client".into(),
            client_secret: "facebook-secret".into(),
            callback_url: None,
        },
    }
}

async fn create_test_db() -> sea_orm::DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.expect("connect");

    db.execute(Statement::from_string(
        DbBackend::Sqlite,
        r#"CREATE TABLE "user" (
            id TEXT PRIMARY KEY,
            username TEXT NULL UNIQUE,
            password_hash TEXT NULL,
            created_at TEXT NOT NULL,
            last_login_at TEXT NULL
        );"#,
    ))
    .await
    .expect("create user table");

    db.execute(Statement::from_string(
        DbBackend::Sqlite,
        r#"CREATE TABLE provider_identity (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            provider TEXT NOT NULL,
            subject TEXT NOT NULL,
            display_name TEXT NULL,
            created_at TEXT NOT NULL,
            UNIQUE(provider, subject)
        );"#,
    ))
    .await
    .expect("create provider_identity table");

    db.execute(Statement::from_string(
        DbBackend::Sqlite,
        r#"CREATE TABLE secret (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            owner_id TEXT NOT NULL,
            body TEXT NOT NULL,
            created_at TEXT NOT NULL
        );"#,
    ))
    .await
    .expect("create secret table");

    db
}

/// Server state whose Google flow points at the mock provider.
async fn test_state(provider_base: &str) -> ServerState {
    let db = Arc::new(create_test_db().await);
    let config = Arc::new(test_config());

    let store = CredentialStore::new(db.clone());
    let resolver = IdentityResolver::new(store.clone());

    let google = Arc::new(
        OAuthFlow::new(ProviderConfig {
            provider: Provider::Google,
            client_id: "google-client".into(),
            client_secret: "google-secret".into(),
            auth_url: format!("{provider_base}/authorize"),
            token_url: format!("{provider_base}/token"),
            user_info_url: format!("{provider_base}/userinfo"),
            callback_url: "http://localhost:3000/auth/google/secrets".into(),
            scopes: vec!["openid".into()],
        })
        .expect("flow"),
    );
    let facebook = Arc::new(
        OAuthFlow::new(ProviderConfig::facebook(&config.facebook, &config.public_url))
            .expect("flow"),
    );

    ServerState {
        resources: AppResources { db, config },
        store,
        resolver,
        google,
        facebook,
    }
}

fn test_server(state: ServerState) -> TestServer {
    TestServer::builder()
        .save_cookies()
        .build(build_router(state))
        .expect("test server")
}

fn location_of(response: &axum_test::TestResponse) -> String {
    response
        .header("location")
        .to_str()
        .expect("location header")
        .to_string()
}

/// Pull the `state` query parameter out of the authorize redirect.
fn state_param(authorize_location: &str) -> String {
    let url = oauth2::url::Url::parse(authorize_location).expect("authorize url");
    url.query_pairs()
        .find(|(key, _)| key == "state")
        .map(|(_, value)| value.into_owned())
        .expect("state param")
}

async fn mount_token_endpoint(provider: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "at-test-123",
            "token_type": "Bearer",
            "expires_in": 3600,
        })))
        .mount(provider)
        .await;
}

async fn mount_userinfo_endpoint(provider: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/userinfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(provider)
        .await;
}

/// Drive initiate + callback for the mocked Google flow.
async fn run_callback(server: &TestServer) -> axum_test::TestResponse {
    let initiate = server.get("/auth/google").await;
    initiate.assert_status_see_other();
    let state = state_param(&location_of(&initiate));

    server
        .get("/auth/google/secrets")
        .add_query_param("code", "test-code")
        .add_query_param("state", state)
        .await
}

#[tokio::test]
async fn callback_creates_account_and_establishes_session() {
    let provider = MockServer::start().await;
    mount_token_endpoint(&provider).await;
    mount_userinfo_endpoint(
        &provider,
        serde_json::json!({"sub": "g123", "name": "Grace"}),
    )
    .await;

    let state = test_state(&provider.uri()).await;
    let server = test_server(state.clone());

    let callback = run_callback(&server).await;
    callback.assert_status_see_other();
    assert_eq!(location_of(&callback), "/secrets");

    server.get("/secrets").await.assert_status_ok();

    let linked = state
        .store
        .find_by_provider(Provider::Google, "g123")
        .await
        .unwrap();
    assert!(linked.is_some());
    assert_eq!(linked.unwrap().username, None);
}

#[tokio::test]
async fn repeated_callback_reuses_the_same_account() {
    let provider = MockServer::start().await;
    mount_token_endpoint(&provider).await;
    mount_userinfo_endpoint(
        &provider,
        serde_json::json!({"sub": "g123", "name": "Grace"}),
    )
    .await;

    let state = test_state(&provider.uri()).await;
    let server = test_server(state.clone());

    run_callback(&server).await.assert_status_see_other();
    let first = state
        .store
        .find_by_provider(Provider::Google, "g123")
        .await
        .unwrap()
        .expect("account created");

    server.get("/logout").await;
    run_callback(&server).await.assert_status_see_other();

    let second = state
        .store
        .find_by_provider(Provider::Google, "g123")
        .await
        .unwrap()
        .expect("account still there");
    assert_eq!(first.id, second.id);

    let users = user::Entity::find()
        .all(state.resources.db.as_ref())
        .await
        .unwrap();
    assert_eq!(users.len(), 1, "no duplicate account for the same subject");
}

#[tokio::test]
async fn state_mismatch_is_rejected_without_a_session() {
    let provider = MockServer::start().await;
    mount_token_endpoint(&provider).await;
    mount_userinfo_endpoint(&provider, serde_json::json!({"sub": "g123"})).await;

    let state = test_state(&provider.uri()).await;
    let server = test_server(state.clone());

    server.get("/auth/google").await.assert_status_see_other();
    let callback = server
        .get("/auth/google/secrets")
        .add_query_param("code", "test-code")
        .add_query_param("state", "forged-state")
        .await;
    callback.assert_status_see_other();
    assert!(location_of(&callback).starts_with("/login"));

    let secrets = server.get("/secrets").await;
    secrets.assert_status_see_other();

    let users = user::Entity::find()
        .all(state.resources.db.as_ref())
        .await
        .unwrap();
    assert!(users.is_empty());
}

#[tokio::test]
async fn provider_denial_lands_back_on_login() {
    let provider = MockServer::start().await;
    let state = test_state(&provider.uri()).await;
    let server = test_server(state.clone());

    server.get("/auth/google").await.assert_status_see_other();
    let callback = server
        .get("/auth/google/secrets")
        .add_query_param("error", "access_denied")
        .await;
    callback.assert_status_see_other();
    assert!(location_of(&callback).starts_with("/login"));
}

#[tokio::test]
async fn callback_without_initiate_is_rejected() {
    let provider = MockServer::start().await;
    mount_token_endpoint(&provider).await;
    mount_userinfo_endpoint(&provider, serde_json::json!({"sub": "g123"})).await;

    let state = test_state(&provider.uri()).await;
    let server = test_server(state);

    // No prior /auth/google, so there is no stored state to match.
    let callback = server
        .get("/auth/google/secrets")
        .add_query_param("code", "test-code")
        .add_query_param("state", "whatever")
        .await;
    callback.assert_status_see_other();
    assert!(location_of(&callback).starts_with("/login"));
}

#[tokio::test]
async fn profile_without_subject_creates_nothing() {
    let provider = MockServer::start().await;
    mount_token_endpoint(&provider).await;
    // Display name only; the provider-assigned id is missing.
    mount_userinfo_endpoint(&provider, serde_json::json!({"name": "No Subject"})).await;

    let state = test_state(&provider.uri()).await;
    let server = test_server(state.clone());

    let callback = run_callback(&server).await;
    callback.assert_status_see_other();
    assert!(location_of(&callback).starts_with("/login"));

    let users = user::Entity::find()
        .all(state.resources.db.as_ref())
        .await
        .unwrap();
    assert!(users.is_empty());
}
