//! Common test utilities for access-service integration tests.

use access_service::config::{AccessConfig, DatabaseConfig, DuplicateGrantPolicy};
use access_service::services::Database;
use access_service::startup::Application;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Value, json};
use service_core::config::Config as CommonConfig;
use std::sync::Once;
use tokio::sync::OnceCell;
use uuid::Uuid;

static INIT: Once = Once::new();
static MIGRATIONS: OnceCell<()> = OnceCell::const_new();

/// Apply migrations once per test binary; every subsequent spawn skips
/// them.
async fn ensure_migrations(database_url: &str) {
    MIGRATIONS
        .get_or_init(|| async {
            let db = Database::new(database_url, 1, 1)
                .await
                .expect("Failed to connect for migrations");
            db.run_migrations().await.expect("Failed to run migrations");
        })
        .await;
}

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,access_service=debug,sqlx=warn")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }
}

/// Spawn a test application with the default duplicate-grant policy.
pub async fn spawn_app() -> TestApp {
    spawn_app_with_policy(DuplicateGrantPolicy::AnyStatus).await
}

/// Spawn a test application listening on an ephemeral port.
pub async fn spawn_app_with_policy(policy: DuplicateGrantPolicy) -> TestApp {
    init_tracing();

    let database_url = std::env::var("TEST_DATABASE_URL")
        .expect("TEST_DATABASE_URL must be set - point it at a disposable Postgres database");

    ensure_migrations(&database_url).await;

    let config = AccessConfig {
        common: CommonConfig { port: 0 },
        service_name: "access-service-test".to_string(),
        service_version: "test".to_string(),
        log_level: "debug".to_string(),
        database: DatabaseConfig {
            url: database_url,
            max_connections: 2,
            min_connections: 1,
        },
        duplicate_grant_policy: policy,
    };

    let app = Application::build_without_migrations(config)
        .await
        .expect("Failed to build application");

    let port = app.port();
    tokio::spawn(async move {
        app.run_until_stopped().await.ok();
    });

    let client = reqwest::Client::new();
    let address = format!("http://127.0.0.1:{}", port);

    // Wait for the server to accept connections.
    let mut attempts = 0;
    loop {
        match client.get(format!("{}/ready", address)).send().await {
            Ok(_) => break,
            Err(_) if attempts < 20 => {
                attempts += 1;
                tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
            }
            Err(e) => panic!("Server did not come up after 20 attempts: {}", e),
        }
    }

    TestApp { address, client }
}

/// Canonical wire rendering of a timestamp.
pub fn iso(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn unique_email() -> String {
    format!("user-{}@example.com", Uuid::new_v4())
}

pub fn unique_full_name() -> String {
    format!("Test User {}", Uuid::new_v4())
}

pub fn unique_resource_name() -> String {
    format!("resource-{}", Uuid::new_v4())
}

/// Create an active user and return its JSON representation.
pub async fn create_test_user(app: &TestApp) -> Value {
    create_test_user_with(app, true).await
}

pub async fn create_test_user_with(app: &TestApp, is_active: bool) -> Value {
    let response = app
        .client
        .post(app.url("/users"))
        .json(&json!({
            "email": unique_email(),
            "full_name": unique_full_name(),
            "is_active": is_active,
        }))
        .send()
        .await
        .expect("Failed to create user");

    assert_eq!(response.status().as_u16(), 201);
    response.json().await.expect("User response was not JSON")
}

/// Create an enabled resource and return its JSON representation.
pub async fn create_test_resource(app: &TestApp) -> Value {
    create_test_resource_with(app, true).await
}

pub async fn create_test_resource_with(app: &TestApp, is_enabled: bool) -> Value {
    let response = app
        .client
        .post(app.url("/resources"))
        .json(&json!({
            "name": unique_resource_name(),
            "description": "integration test resource",
            "is_enabled": is_enabled,
        }))
        .send()
        .await
        .expect("Failed to create resource");

    assert_eq!(response.status().as_u16(), 201);
    response
        .json()
        .await
        .expect("Resource response was not JSON")
}

/// Post an access grant; returns the raw response so failure cases can be
/// asserted too.
pub async fn post_access(
    app: &TestApp,
    user_id: &str,
    resource_id: &str,
    expires_at: DateTime<Utc>,
) -> reqwest::Response {
    app.client
        .post(app.url("/accesses"))
        .json(&json!({
            "user_id": user_id,
            "resource_id": resource_id,
            "expires_at": iso(expires_at),
        }))
        .send()
        .await
        .expect("Failed to post access")
}

/// Create a grant expiring in one hour, asserting success.
pub async fn create_test_access(app: &TestApp, user_id: &str, resource_id: &str) -> Value {
    let response = post_access(
        app,
        user_id,
        resource_id,
        Utc::now() + chrono::Duration::hours(1),
    )
    .await;

    assert_eq!(response.status().as_u16(), 201);
    response.json().await.expect("Access response was not JSON")
}
