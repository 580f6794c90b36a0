//! End-to-end authentication tests against a real Postgres instance.
//! Each test gets its own freshly migrated database, so tests never
//! share state.

use std::net::TcpListener;
use std::time::{Duration, Instant};

use auth_api::configuration::{get_configuration, DatabaseSettings};
use auth_api::startup::run;
use auth_api::store::{create_user, Role};
use serde_json::{json, Value};
use sqlx::{Connection, Executor, PgConnection, PgPool};

pub struct TestApp {
    pub address: String,
    pub db_pool: PgPool,
}

async fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let mut configuration = get_configuration().expect("Failed to read configuration.");
    configuration.database.database_name = uuid::Uuid::new_v4().to_string();
    let connection_pool = configure_database(&configuration.database).await;

    let jwt_config = configuration.jwt.clone();
    let server = run(listener, connection_pool.clone(), jwt_config)
        .expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        db_pool: connection_pool,
    }
}

pub async fn configure_database(config: &DatabaseSettings) -> PgPool {
    let mut connection = PgConnection::connect(&config.connection_string_without_db())
        .await
        .expect("Failed to connect to Postgres");
    connection
        .execute(&*format!(r#"CREATE DATABASE "{}";"#, config.database_name))
        .await
        .expect("Failed to create database.");

    let connection_pool = PgPool::connect(&config.connection_string())
        .await
        .expect("Failed to connect to Postgres.");
    sqlx::migrate!("./migrations")
        .run(&connection_pool)
        .await
        .expect("Failed to migrate the database.");
    connection_pool
}

async fn register(app: &TestApp, username: &str, password: &str) -> reqwest::Response {
    reqwest::Client::new()
        .post(&format!("{}/auth/register", &app.address))
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await
        .expect("Failed to execute request.")
}

async fn login(app: &TestApp, username: &str, password: &str) -> reqwest::Response {
    reqwest::Client::new()
        .post(&format!("{}/auth/login", &app.address))
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await
        .expect("Failed to execute request.")
}

// --- Registration ---

#[tokio::test]
async fn register_returns_201_with_tokens() {
    let app = spawn_app().await;

    let response = register(&app, "alice", "Secret123!").await;
    assert_eq!(201, response.status().as_u16());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(!body["access_token"].as_str().unwrap().is_empty());
    assert!(!body["refresh_token"].as_str().unwrap().is_empty());
    assert_eq!(body["token_type"], "bearer");
    assert_eq!(body["user"]["username"], "alice");
    assert_eq!(body["user"]["role"], "user");

    // Row exists and the password is not stored in plaintext
    let (username, password_hash): (String, String) =
        sqlx::query_as("SELECT username, password_hash FROM users WHERE username = 'alice'")
            .fetch_one(&app.db_pool)
            .await
            .expect("Failed to fetch created user");
    assert_eq!(username, "alice");
    assert_ne!(password_hash, "Secret123!");
    assert!(password_hash.starts_with("$2"));
}

#[tokio::test]
async fn register_returns_400_for_invalid_username() {
    let app = spawn_app().await;

    let long_username = "a".repeat(51);
    let invalid_usernames = vec![
        ("ab", "too short"),
        (long_username.as_str(), "too long"),
        ("with space", "contains whitespace"),
        ("semi;colon", "forbidden character"),
        ("", "empty"),
    ];

    for (username, reason) in invalid_usernames {
        let response = register(&app, username, "Secret123!").await;
        assert_eq!(
            400,
            response.status().as_u16(),
            "Should reject username: {}",
            reason
        );
    }
}

#[tokio::test]
async fn register_returns_400_for_overlong_password() {
    let app = spawn_app().await;

    let response = register(&app, "alice", &"a".repeat(101)).await;
    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn register_returns_409_for_duplicate_username() {
    let app = spawn_app().await;

    let response = register(&app, "alice", "Secret123!").await;
    assert_eq!(201, response.status().as_u16());

    let response = register(&app, "alice", "Different456!").await;
    assert_eq!(
        409,
        response.status().as_u16(),
        "Should reject duplicate username with 409 Conflict"
    );
}

// --- Login ---

#[tokio::test]
async fn login_returns_200_with_tokens_for_valid_credentials() {
    let app = spawn_app().await;
    register(&app, "alice", "Secret123!").await;

    let response = login(&app, "alice", "Secret123!").await;
    assert_eq!(200, response.status().as_u16());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(!body["access_token"].as_str().unwrap().is_empty());
    assert!(!body["refresh_token"].as_str().unwrap().is_empty());
    assert_eq!(body["token_type"], "bearer");
    assert_eq!(body["expires_in"], 900);
    assert_eq!(body["user"]["username"], "alice");
    assert_eq!(body["user"]["role"], "user");
}

#[tokio::test]
async fn login_returns_401_for_wrong_password() {
    let app = spawn_app().await;
    register(&app, "alice", "Secret123!").await;

    let response = login(&app, "alice", "WrongPassword1").await;
    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn unknown_user_and_wrong_password_are_indistinguishable() {
    let app = spawn_app().await;
    register(&app, "alice", "Secret123!").await;

    let started = Instant::now();
    let wrong_password = login(&app, "alice", "WrongPassword1").await;
    let wrong_password_elapsed = started.elapsed();

    let started = Instant::now();
    let unknown_user = login(&app, "nobody", "Secret123!").await;
    let unknown_user_elapsed = started.elapsed();

    assert_eq!(401, wrong_password.status().as_u16());
    assert_eq!(401, unknown_user.status().as_u16());

    // Same body shape and message for both failure causes
    let a: Value = wrong_password.json().await.unwrap();
    let b: Value = unknown_user.json().await.unwrap();
    assert_eq!(a["message"], b["message"]);
    assert_eq!(a["code"], b["code"]);

    // Both sit on the latency floor
    let floor = Duration::from_millis(250);
    assert!(wrong_password_elapsed >= floor);
    assert!(unknown_user_elapsed >= floor);
}

// --- Protected endpoints ---

#[tokio::test]
async fn profile_round_trip() {
    let app = spawn_app().await;
    let body: Value = register(&app, "alice", "Secret123!").await.json().await.unwrap();
    let access_token = body["access_token"].as_str().unwrap().to_string();

    let response = reqwest::Client::new()
        .get(&format!("{}/api/profile", &app.address))
        .bearer_auth(&access_token)
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());
    let profile: Value = response.json().await.unwrap();
    assert_eq!(profile["username"], "alice");
    assert_eq!(profile["role"], "user");
}

#[tokio::test]
async fn revoked_token_is_rejected_on_retry() {
    let app = spawn_app().await;
    let body: Value = register(&app, "alice", "Secret123!").await.json().await.unwrap();
    let access_token = body["access_token"].as_str().unwrap().to_string();
    let client = reqwest::Client::new();

    // Works before revocation
    let response = client
        .get(&format!("{}/api/profile", &app.address))
        .bearer_auth(&access_token)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, response.status().as_u16());

    // Logout revokes the presented access token
    let response = client
        .post(&format!("{}/auth/logout", &app.address))
        .bearer_auth(&access_token)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, response.status().as_u16());

    // The same request now fails with the revocation message
    let response = client
        .get(&format!("{}/api/profile", &app.address))
        .bearer_auth(&access_token)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(401, response.status().as_u16());
    let error: Value = response.json().await.unwrap();
    assert_eq!(error["message"], "Token has been revoked");
}

#[tokio::test]
async fn logout_also_revokes_the_refresh_token_when_provided() {
    let app = spawn_app().await;
    let body: Value = register(&app, "alice", "Secret123!").await.json().await.unwrap();
    let access_token = body["access_token"].as_str().unwrap().to_string();
    let refresh_token = body["refresh_token"].as_str().unwrap().to_string();
    let client = reqwest::Client::new();

    let response = client
        .post(&format!("{}/auth/logout", &app.address))
        .bearer_auth(&access_token)
        .json(&json!({ "refresh_token": refresh_token }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, response.status().as_u16());

    let response = client
        .post(&format!("{}/auth/refresh", &app.address))
        .json(&json!({ "refresh_token": refresh_token }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(401, response.status().as_u16());
}

// --- Refresh ---

#[tokio::test]
async fn refresh_rotates_the_token_pair() {
    let app = spawn_app().await;
    let body: Value = register(&app, "alice", "Secret123!").await.json().await.unwrap();
    let old_refresh = body["refresh_token"].as_str().unwrap().to_string();
    let client = reqwest::Client::new();

    let response = client
        .post(&format!("{}/auth/refresh", &app.address))
        .json(&json!({ "refresh_token": old_refresh }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, response.status().as_u16());

    let body: Value = response.json().await.unwrap();
    let new_access = body["access_token"].as_str().unwrap().to_string();
    let new_refresh = body["refresh_token"].as_str().unwrap().to_string();
    assert_ne!(new_refresh, old_refresh);

    // New access token is accepted
    let response = client
        .get(&format!("{}/api/profile", &app.address))
        .bearer_auth(&new_access)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, response.status().as_u16());

    // Replaying the rotated refresh token fails
    let response = client
        .post(&format!("{}/auth/refresh", &app.address))
        .json(&json!({ "refresh_token": old_refresh }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(401, response.status().as_u16());
    let error: Value = response.json().await.unwrap();
    assert_eq!(error["message"], "Token has been revoked");
}

#[tokio::test]
async fn refresh_rejects_an_access_token() {
    let app = spawn_app().await;
    let body: Value = register(&app, "alice", "Secret123!").await.json().await.unwrap();
    let access_token = body["access_token"].as_str().unwrap().to_string();

    let response = reqwest::Client::new()
        .post(&format!("{}/auth/refresh", &app.address))
        .json(&json!({ "refresh_token": access_token }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn refresh_token_cannot_reach_protected_endpoints() {
    let app = spawn_app().await;
    let body: Value = register(&app, "alice", "Secret123!").await.json().await.unwrap();
    let refresh_token = body["refresh_token"].as_str().unwrap().to_string();

    let response = reqwest::Client::new()
        .get(&format!("{}/api/profile", &app.address))
        .bearer_auth(&refresh_token)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(401, response.status().as_u16());
}

// --- Role-gated listing ---

#[tokio::test]
async fn user_listing_requires_admin_role() {
    let app = spawn_app().await;
    let body: Value = register(&app, "alice", "Secret123!").await.json().await.unwrap();
    let access_token = body["access_token"].as_str().unwrap().to_string();

    let response = reqwest::Client::new()
        .get(&format!("{}/api/data?type=users", &app.address))
        .bearer_auth(&access_token)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(403, response.status().as_u16());
}

#[tokio::test]
async fn admin_can_list_users() {
    let app = spawn_app().await;
    register(&app, "alice", "Secret123!").await;

    create_user(&app.db_pool, "root", "RootSecret1!", Role::Admin)
        .await
        .expect("Failed to create admin");

    let body: Value = login(&app, "root", "RootSecret1!").await.json().await.unwrap();
    assert_eq!(body["user"]["role"], "admin");
    let access_token = body["access_token"].as_str().unwrap().to_string();

    let response = reqwest::Client::new()
        .get(&format!("{}/api/data?type=users", &app.address))
        .bearer_auth(&access_token)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, response.status().as_u16());

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["count"], 2);
    let usernames: Vec<&str> = body["users"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["username"].as_str().unwrap())
        .collect();
    assert!(usernames.contains(&"alice"));
    assert!(usernames.contains(&"root"));
}

// --- Posts ---

#[tokio::test]
async fn post_creation_and_listing_round_trip() {
    let app = spawn_app().await;
    let body: Value = register(&app, "alice", "Secret123!").await.json().await.unwrap();
    let access_token = body["access_token"].as_str().unwrap().to_string();
    let client = reqwest::Client::new();

    let response = client
        .post(&format!("{}/api/posts", &app.address))
        .bearer_auth(&access_token)
        .json(&json!({ "title": "First post", "content": "Hello there" }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(201, response.status().as_u16());
    let created: Value = response.json().await.unwrap();
    assert!(created["post_id"].as_i64().unwrap() > 0);

    let response = client
        .get(&format!("{}/api/data?type=posts", &app.address))
        .bearer_auth(&access_token)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, response.status().as_u16());

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["count"], 1);
    assert_eq!(body["requested_by"], "alice");
    assert_eq!(body["data"][0]["title"], "First post");
    assert_eq!(body["data"][0]["author"], "alice");
}

#[tokio::test]
async fn post_with_empty_title_returns_400() {
    let app = spawn_app().await;
    let body: Value = register(&app, "alice", "Secret123!").await.json().await.unwrap();
    let access_token = body["access_token"].as_str().unwrap().to_string();

    let response = reqwest::Client::new()
        .post(&format!("{}/api/posts", &app.address))
        .bearer_auth(&access_token)
        .json(&json!({ "title": "   ", "content": "body" }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn unknown_data_type_returns_400() {
    let app = spawn_app().await;
    let body: Value = register(&app, "alice", "Secret123!").await.json().await.unwrap();
    let access_token = body["access_token"].as_str().unwrap().to_string();

    let response = reqwest::Client::new()
        .get(&format!("{}/api/data?type=comments", &app.address))
        .bearer_auth(&access_token)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(400, response.status().as_u16());
}
