//! User management integration tests.
//!
//! Require a Postgres database; run with TEST_DATABASE_URL set.

mod common;

use common::{create_test_user, spawn_app, unique_email, unique_full_name};
use serde_json::{Value, json};
use uuid::Uuid;

#[tokio::test]
#[ignore] // Requires database
async fn create_user_returns_created_record() {
    let app = spawn_app().await;

    let email = unique_email();
    let full_name = unique_full_name();
    let response = app
        .client
        .post(app.url("/users"))
        .json(&json!({ "email": email, "full_name": full_name }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 201);
    let user: Value = response.json().await.unwrap();
    assert_eq!(user["email"], email.as_str());
    assert_eq!(user["full_name"], full_name.as_str());
    assert_eq!(user["is_active"], true);
    assert!(user["id"].as_str().is_some());
}

#[tokio::test]
#[ignore]
async fn duplicate_email_is_conflict() {
    let app = spawn_app().await;

    let email = unique_email();
    let first = app
        .client
        .post(app.url("/users"))
        .json(&json!({ "email": email, "full_name": unique_full_name() }))
        .send()
        .await
        .unwrap();
    assert_eq!(first.status().as_u16(), 201);

    let second = app
        .client
        .post(app.url("/users"))
        .json(&json!({ "email": email, "full_name": unique_full_name() }))
        .send()
        .await
        .unwrap();
    assert_eq!(second.status().as_u16(), 409);
}

#[tokio::test]
#[ignore]
async fn duplicate_full_name_is_conflict() {
    let app = spawn_app().await;

    let full_name = unique_full_name();
    let first = app
        .client
        .post(app.url("/users"))
        .json(&json!({ "email": unique_email(), "full_name": full_name }))
        .send()
        .await
        .unwrap();
    assert_eq!(first.status().as_u16(), 201);

    let second = app
        .client
        .post(app.url("/users"))
        .json(&json!({ "email": unique_email(), "full_name": full_name }))
        .send()
        .await
        .unwrap();
    assert_eq!(second.status().as_u16(), 409);
}

#[tokio::test]
#[ignore]
async fn email_duplicate_check_is_case_sensitive() {
    let app = spawn_app().await;

    let email = unique_email();
    let first = app
        .client
        .post(app.url("/users"))
        .json(&json!({ "email": email, "full_name": unique_full_name() }))
        .send()
        .await
        .unwrap();
    assert_eq!(first.status().as_u16(), 201);

    // Same address with a different case is a different stored value.
    let upper = email.to_uppercase();
    let second = app
        .client
        .post(app.url("/users"))
        .json(&json!({ "email": upper, "full_name": unique_full_name() }))
        .send()
        .await
        .unwrap();
    assert_eq!(second.status().as_u16(), 201);
}

#[tokio::test]
#[ignore]
async fn malformed_email_is_rejected() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/users"))
        .json(&json!({ "email": "not-an-email", "full_name": unique_full_name() }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 422);
}

#[tokio::test]
#[ignore]
async fn too_short_full_name_is_rejected() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/users"))
        .json(&json!({ "email": unique_email(), "full_name": "abc" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 422);
}

#[tokio::test]
#[ignore]
async fn get_user_round_trips() {
    let app = spawn_app().await;

    let user = create_test_user(&app).await;
    let user_id = user["id"].as_str().unwrap();

    let response = app
        .client
        .get(app.url(&format!("/users/{}", user_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let fetched: Value = response.json().await.unwrap();
    assert_eq!(fetched, user);
}

#[tokio::test]
#[ignore]
async fn get_unknown_user_is_not_found() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(app.url(&format!("/users/{}", Uuid::new_v4())))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
#[ignore]
async fn list_users_matches_substring_case_insensitively() {
    let app = spawn_app().await;

    let user = create_test_user(&app).await;
    let full_name = user["full_name"].as_str().unwrap();
    // The unique suffix, upper-cased, should still match via ILIKE.
    let needle = full_name[10..].to_uppercase();

    let response = app
        .client
        .get(app.url(&format!("/users?search={}", needle)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let users: Vec<Value> = response.json().await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["id"], user["id"]);
}

#[tokio::test]
#[ignore]
async fn patch_toggles_active_flag_only() {
    let app = spawn_app().await;

    let user = create_test_user(&app).await;
    let user_id = user["id"].as_str().unwrap();

    let response = app
        .client
        .patch(app.url(&format!("/users/{}", user_id)))
        .json(&json!({ "is_active": false }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["is_active"], false);
    assert_eq!(updated["email"], user["email"]);
    assert_eq!(updated["full_name"], user["full_name"]);
}

#[tokio::test]
#[ignore]
async fn patch_unknown_user_is_not_found() {
    let app = spawn_app().await;

    let response = app
        .client
        .patch(app.url(&format!("/users/{}", Uuid::new_v4())))
        .json(&json!({ "is_active": false }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}
