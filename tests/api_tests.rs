use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use platter::config::Config;
use tower::ServiceExt;

/// Admin account seeded by the initial migration.
const ADMIN_EMAIL: &str = "admin@platter.local";
const ADMIN_PASSWORD: &str = "admin1234";

fn test_config() -> Config {
    let mut config = Config::default();
    config.database.path = "sqlite::memory:".to_string();
    config.auth.jwt_secret = "integration-test-secret-0123456789abcdef".to_string();
    // Keep password hashing fast in tests.
    config.auth.argon2_memory_cost_kib = 1024;
    config.auth.argon2_time_cost = 1;
    config
}

async fn spawn_app() -> Router {
    let state = platter::api::create_app_state_from_config(test_config())
        .await
        .expect("Failed to create app state");
    platter::api::router(state)
}

async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(serde_json::to_string(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn login(app: &Router, email: &str, password: &str) -> String {
    let (status, body) = request(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(serde_json::json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["data"]["token"].as_str().unwrap().to_string()
}

async fn signup(app: &Router, name: &str, email: &str, password: &str) -> String {
    let (status, body) = request(
        app,
        "POST",
        "/api/auth/signup",
        None,
        Some(serde_json::json!({
            "name": name,
            "email": email,
            "password": password,
            "password_confirm": password,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "signup failed: {body}");
    body["data"]["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_protected_routes_require_auth() {
    let app = spawn_app().await;

    for uri in ["/api/users/me", "/api/orders/mine", "/api/users"] {
        let (status, body) = request(&app, "GET", uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri} should be guarded");
        assert_eq!(body["success"], false);
    }

    let (status, _) = request(&app, "GET", "/api/users/me", Some("garbage-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_signup_rejects_duplicate_email() {
    let app = spawn_app().await;

    signup(&app, "Alice", "alice@example.com", "password123").await;

    let (status, body) = request(
        &app,
        "POST",
        "/api/auth/signup",
        None,
        Some(serde_json::json!({
            "name": "Imposter",
            "email": "alice@example.com",
            "password": "password123",
            "password_confirm": "password123",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_signup_never_grants_admin() {
    let app = spawn_app().await;

    // A role field in the signup payload is ignored.
    let (status, body) = request(
        &app,
        "POST",
        "/api/auth/signup",
        None,
        Some(serde_json::json!({
            "name": "Sneaky",
            "email": "sneaky@example.com",
            "password": "password123",
            "password_confirm": "password123",
            "role": "admin",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["role"], "customer");
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let app = spawn_app().await;

    let (status, body) = request(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(serde_json::json!({ "email": ADMIN_EMAIL, "password": "not-the-password" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_login_sets_session_cookie() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD })
                        .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .headers()
        .get("set-cookie")
        .expect("login should set a cookie")
        .to_str()
        .unwrap();
    assert!(cookie.starts_with("token="));
    assert!(cookie.contains("HttpOnly"));
}

#[tokio::test]
async fn test_cookie_authenticates_requests() {
    let app = spawn_app().await;

    let token = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/users/me")
                .header("Cookie", format!("other=1; token={token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_user_listing_is_admin_only() {
    let app = spawn_app().await;

    let customer_token = signup(&app, "Bob", "bob@example.com", "password123").await;
    let (status, _) = request(&app, "GET", "/api/users", Some(&customer_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin_token = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let (status, body) = request(&app, "GET", "/api/users", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().len() >= 2);
}

#[tokio::test]
async fn test_profile_update_refuses_password_fields() {
    let app = spawn_app().await;

    let token = signup(&app, "Carol", "carol@example.com", "password123").await;

    let (status, body) = request(
        &app,
        "PATCH",
        "/api/users/me",
        Some(&token),
        Some(serde_json::json!({ "password": "newpassword1" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("/api/auth/password"));

    let (status, body) = request(
        &app,
        "PATCH",
        "/api/users/me",
        Some(&token),
        Some(serde_json::json!({ "name": "Caroline" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Caroline");
}

#[tokio::test]
async fn test_deactivated_account_cannot_login() {
    let app = spawn_app().await;

    let token = signup(&app, "Dave", "dave@example.com", "password123").await;

    let (status, _) = request(&app, "DELETE", "/api/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = request(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(serde_json::json!({ "email": "dave@example.com", "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // The surviving token is dead too.
    let (status, _) = request(&app, "GET", "/api/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_password_change_invalidates_old_sessions() {
    let app = spawn_app().await;

    let old_token = signup(&app, "Erin", "erin@example.com", "password123").await;

    // Token freshness is tracked at second granularity.
    tokio::time::sleep(std::time::Duration::from_secs(2)).await;

    let (status, body) = request(
        &app,
        "PATCH",
        "/api/auth/password",
        Some(&old_token),
        Some(serde_json::json!({
            "current_password": "password123",
            "password": "evenbetter456",
            "password_confirm": "evenbetter456",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let new_token = body["data"]["token"].as_str().unwrap().to_string();

    let (status, _) = request(&app, "GET", "/api/users/me", Some(&old_token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = request(&app, "GET", "/api/users/me", Some(&new_token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_forgot_password_does_not_leak_accounts() {
    let app = spawn_app().await;

    signup(&app, "Frank", "frank@example.com", "password123").await;

    let (known_status, known_body) = request(
        &app,
        "POST",
        "/api/auth/forgot-password",
        None,
        Some(serde_json::json!({ "email": "frank@example.com" })),
    )
    .await;
    let (unknown_status, unknown_body) = request(
        &app,
        "POST",
        "/api/auth/forgot-password",
        None,
        Some(serde_json::json!({ "email": "nobody@example.com" })),
    )
    .await;

    assert_eq!(known_status, StatusCode::OK);
    assert_eq!(unknown_status, StatusCode::OK);
    assert_eq!(known_body, unknown_body);
}

#[tokio::test]
async fn test_dish_projection_by_role() {
    let app = spawn_app().await;

    let admin_token = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let (status, body) = request(
        &app,
        "POST",
        "/api/dishes",
        Some(&admin_token),
        Some(serde_json::json!({
            "name": "Pad Thai",
            "description": "Stir-fried noodles",
            "price": 12.5,
            "inventory": 40,
            "image_cover": "pad-thai.jpg",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create dish failed: {body}");
    let dish_id = body["data"]["id"].as_i64().unwrap();

    // Anonymous callers get the menu view without stock internals.
    let (status, body) = request(&app, "GET", &format!("/api/dishes/{dish_id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Pad Thai");
    assert!(body["data"].get("inventory").is_none());
    assert!(body["data"].get("order_count").is_none());

    // Admins see the whole record.
    let (status, body) = request(
        &app,
        "GET",
        &format!("/api/dishes/{dish_id}"),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["inventory"], 40);
}

#[tokio::test]
async fn test_dish_management_is_admin_only() {
    let app = spawn_app().await;

    let customer_token = signup(&app, "Grace", "grace@example.com", "password123").await;

    let (status, _) = request(
        &app,
        "POST",
        "/api/dishes",
        Some(&customer_token),
        Some(serde_json::json!({
            "name": "Forbidden Rice",
            "description": "Should not exist",
            "price": 1.0,
            "inventory": 1,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = request(&app, "DELETE", "/api/dishes/1", Some(&customer_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_duplicate_dish_name_conflicts() {
    let app = spawn_app().await;

    let admin_token = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let dish = serde_json::json!({
        "name": "Laksa",
        "description": "Spicy noodle soup",
        "price": 9.0,
        "inventory": 20,
    });

    let (status, _) = request(&app, "POST", "/api/dishes", Some(&admin_token), Some(dish.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = request(&app, "POST", "/api/dishes", Some(&admin_token), Some(dish)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_unknown_dish_is_404() {
    let app = spawn_app().await;

    let (status, _) = request(&app, "GET", "/api/dishes/9999", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = request(&app, "GET", "/api/dishes/0", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
