use axum::http::{Method, StatusCode};
use serde_json::json;

use integration_tests::{token_of, TestApp};

#[tokio::test]
async fn test_register_login_and_list_round_trip() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post_json(
            "/api/auth/register",
            None,
            json!({
                "username": "alice",
                "email": "alice@example.com",
                "password": "password1",
                "age_group": "Adult",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");
    assert_eq!(body["role"], "Standard");
    assert_eq!(body["age_group"], "Adult");

    let (status, body) = app.login("alice", "password1").await;
    assert_eq!(status, StatusCode::OK);
    let token = token_of(&body);

    let (status, body) = app.get("/api/posts", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_registration_never_grants_admin() {
    let app = TestApp::new().await;
    let (status, body) = app
        .post_json(
            "/api/auth/register",
            None,
            json!({
                "username": "mallory",
                "email": "mallory@example.com",
                "password": "password1",
                "age_group": "Adult",
                "role": "Admin",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "Standard");

    let (status, _) = app
        .post_json(
            "/api/posts",
            Some(&token_of(&body)),
            json!({ "title": "t", "body": "b", "category": "Sport" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_duplicate_username_conflicts() {
    let app = TestApp::new().await;
    app.register("bob", "Senior").await;

    let (status, body) = app
        .post_json(
            "/api/auth/register",
            None,
            json!({
                "username": "bob",
                "email": "other@example.com",
                "password": "password2",
                "age_group": "Adult",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_invalid_registration_is_rejected() {
    let app = TestApp::new().await;
    for (username, email, password) in [
        ("ab", "ab@example.com", "password1"),
        ("carol", "not-an-email", "password1"),
        ("carol", "carol@example.com", "short"),
    ] {
        let (status, _) = app
            .post_json(
                "/api/auth/register",
                None,
                json!({
                    "username": username,
                    "email": email,
                    "password": password,
                    "age_group": "Adult",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{username} / {email} / {password}");
    }
}

#[tokio::test]
async fn test_bad_credentials_are_indistinguishable() {
    let app = TestApp::new().await;
    app.register("dave", "Adult").await;

    let (wrong_password, wrong_body) = app.login("dave", "nope-nope").await;
    let (unknown_user, unknown_body) = app.login("nobody", "password1").await;
    assert_eq!(wrong_password, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, unknown_body);
}

#[tokio::test]
async fn test_protected_routes_require_a_valid_token() {
    let app = TestApp::new().await;

    let (status, body) = app.call(Method::GET, "/api/posts", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, _) = app.get("/api/posts", "not.a.jwt").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .post_json("/api/comments", None, json!({ "body": "hi", "post_id": 1 }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_is_public() {
    let app = TestApp::new().await;
    let (status, body) = app.call(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_malformed_registration_bodies_are_bad_requests() {
    let app = TestApp::new().await;
    for body in [
        json!({
            "username": "teen",
            "email": "teen@example.com",
            "password": "password1",
            "age_group": "Teen",
        }),
        json!({ "username": "nopass", "email": "nopass@example.com", "age_group": "Adult" }),
    ] {
        let (status, reply) = app.post_json("/api/auth/register", None, body.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert!(reply["error"].is_string(), "{reply}");
    }

    let (status, reply) = app
        .post_json("/api/auth/login", None, json!({ "username": "admin" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(reply["error"].is_string());
}
