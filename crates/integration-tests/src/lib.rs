//! Shared harness for the HTTP scenarios under `tests/`: a fully wired
//! router over a fresh in-memory store, with a seeded administrator.

#![cfg(feature = "web-axum")]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tower::ServiceExt;

use api_adapters::{build_router, AppState};
use auth_adapters::{ensure_admin, AdminSeed, JwtTokenService, PasswordIdentityProvider};
use domains::{AgeGroup, Claims, CommentRepo, PostRepo, UserRepo};
use services::{CommentService, ContentService};
use storage_adapters::MemoryStore;

pub const SECRET: &[u8] = b"integration-test-secret";
pub const ISSUER: &str = "gatepost";
pub const AUDIENCE: &str = "gatepost-clients";
pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "Admin123!";

pub struct TestApp {
    router: Router,
    pub store: MemoryStore,
}

impl TestApp {
    pub async fn new() -> Self {
        let store = MemoryStore::new();
        let posts: Arc<dyn PostRepo> = Arc::new(store.clone());
        let comments: Arc<dyn CommentRepo> = Arc::new(store.clone());
        let users: Arc<dyn UserRepo> = Arc::new(store.clone());

        ensure_admin(
            users.as_ref(),
            AdminSeed {
                username: ADMIN_USERNAME.into(),
                email: "admin@gatepost.local".into(),
                password: ADMIN_PASSWORD.into(),
                age_group: AgeGroup::Adult,
            },
        )
        .await
        .expect("seed admin");

        let state = AppState {
            content: Arc::new(ContentService::new(posts.clone(), comments.clone(), users.clone())),
            comments: Arc::new(CommentService::new(posts, comments, users.clone())),
            identity: Arc::new(PasswordIdentityProvider::new(users)),
            tokens: Arc::new(JwtTokenService::new(SECRET, ISSUER, AUDIENCE, 30)),
        };

        Self {
            router: build_router(state),
            store,
        }
    }

    /// Sends one request and returns the status with the raw body.
    pub async fn call_raw(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Vec<u8>) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = self.router.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        (status, bytes.to_vec())
    }

    /// Sends one request and returns the status with the decoded JSON body
    /// (`Value::Null` when the body is empty).
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let (status, bytes) = self.call_raw(method, uri, token, body).await;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("JSON body")
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.call(Method::GET, uri, Some(token), None).await
    }

    pub async fn post_json(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.call(Method::DELETE, uri, Some(token), None).await
    }

    pub async fn login(&self, username: &str, password: &str) -> (StatusCode, Value) {
        self.post_json(
            "/api/auth/login",
            None,
            json!({ "username": username, "password": password }),
        )
        .await
    }

    pub async fn admin_token(&self) -> String {
        let (status, body) = self.login(ADMIN_USERNAME, ADMIN_PASSWORD).await;
        assert_eq!(status, StatusCode::OK, "admin login failed: {body}");
        token_of(&body)
    }

    /// Registers `username` with password `password1` and returns its token.
    pub async fn register(&self, username: &str, age_group: &str) -> String {
        let (status, body) = self
            .post_json(
                "/api/auth/register",
                None,
                json!({
                    "username": username,
                    "email": format!("{username}@example.com"),
                    "password": "password1",
                    "age_group": age_group,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "registration failed: {body}");
        token_of(&body)
    }

    /// Creates a post as admin and returns its id.
    pub async fn publish(&self, title: &str, category: &str) -> i64 {
        let admin = self.admin_token().await;
        let (status, body) = self
            .post_json(
                "/api/posts",
                Some(&admin),
                json!({ "title": title, "body": format!("{title} body"), "category": category }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "publish failed: {body}");
        body["id"].as_i64().expect("post id")
    }

    /// Signs a token with hand-picked claims, for exercising missing or
    /// unusual role and age-group values.
    pub fn token_with_claims(&self, sub: &str, name: &str, role: Option<&str>, age_group: Option<&str>) -> String {
        let now = Utc::now();
        let claims = Claims {
            sub: sub.into(),
            name: name.into(),
            role: role.map(Into::into),
            age_group: age_group.map(Into::into),
            iss: ISSUER.into(),
            aud: AUDIENCE.into(),
            iat: now.timestamp(),
            exp: (now + Duration::minutes(5)).timestamp(),
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET)).expect("sign")
    }
}

pub fn token_of(body: &Value) -> String {
    body["token"].as_str().expect("token in body").to_string()
}
