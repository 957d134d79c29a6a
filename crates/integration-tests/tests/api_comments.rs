use axum::http::StatusCode;
use serde_json::{json, Value};

use domains::CommentRepo;
use integration_tests::TestApp;

async fn comment(app: &TestApp, token: &str, post_id: i64, parent_id: Option<i64>, body: &str) -> (StatusCode, Value) {
    app.post_json(
        "/api/comments",
        Some(token),
        json!({ "body": body, "post_id": post_id, "parent_id": parent_id }),
    )
    .await
}

#[tokio::test]
async fn test_comment_on_missing_post_is_invalid_for_every_role() {
    let app = TestApp::new().await;
    let user = app.register("fan", "Adult").await;
    let admin = app.admin_token().await;

    for token in [&user, &admin] {
        let (status, body) = comment(&app, token, 999, None, "hello").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }
}

#[tokio::test]
async fn test_replies_render_as_a_nested_tree() {
    let app = TestApp::new().await;
    let id = app.publish("Town hall", "CivicLife").await;
    let alice = app.register("alice", "Adult").await;
    let bob = app.register("bob", "Senior").await;

    let (status, a) = comment(&app, &alice, id, None, "A").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(a["depth"], 0);
    assert_eq!(a["author_name"], "alice");

    let (_, b) = comment(&app, &bob, id, a["id"].as_i64(), "B").await;
    assert_eq!(b["depth"], 1);
    let (_, c) = comment(&app, &alice, id, b["id"].as_i64(), "C").await;
    assert_eq!(c["depth"], 2);
    let (_, d) = comment(&app, &bob, id, None, "D").await;
    assert_eq!(d["depth"], 0);

    let (_, post) = app.get(&format!("/api/posts/{id}"), &alice).await;
    let roots = post["comments"].as_array().expect("comments");
    assert_eq!(roots.len(), 2);
    assert_eq!(roots[0]["body"], "A");
    assert_eq!(roots[1]["body"], "D");

    let b_node = &roots[0]["replies"][0];
    assert_eq!(b_node["body"], "B");
    assert_eq!(b_node["author_name"], "bob");
    assert_eq!(b_node["depth"], 1);
    assert_eq!(b_node["replies"][0]["body"], "C");
    assert_eq!(b_node["replies"][0]["depth"], 2);
}

#[tokio::test]
async fn test_parent_from_another_post_is_invalid() {
    let app = TestApp::new().await;
    let first = app.publish("First", "CivicLife").await;
    let second = app.publish("Second", "CivicLife").await;
    let user = app.register("fan", "Adult").await;

    let (_, root) = comment(&app, &user, first, None, "root").await;
    let (status, _) = comment(&app, &user, second, root["id"].as_i64(), "stray").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = comment(&app, &user, first, Some(4242), "dangling").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_empty_comment_is_rejected() {
    let app = TestApp::new().await;
    let id = app.publish("First", "CivicLife").await;
    let user = app.register("fan", "Adult").await;

    let (status, _) = comment(&app, &user, id, None, "   ").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_age_gate_does_not_block_commenting() {
    let app = TestApp::new().await;
    let id = app.publish("Derby", "Sport").await;
    let child = app.register("kid", "Child").await;

    let (status, _) = comment(&app, &child, id, None, "go team").await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_comment_deletion_rules() {
    let app = TestApp::new().await;
    let id = app.publish("Town hall", "CivicLife").await;
    let alice = app.register("alice", "Adult").await;
    let bob = app.register("bob", "Adult").await;
    let admin = app.admin_token().await;

    let (_, a) = comment(&app, &alice, id, None, "A").await;
    let (_, b) = comment(&app, &bob, id, a["id"].as_i64(), "B").await;
    comment(&app, &bob, id, b["id"].as_i64(), "C").await;
    let (_, d) = comment(&app, &alice, id, None, "D").await;

    // Not the author: indistinguishable from a missing comment.
    let (status, _) = app.delete(&format!("/api/comments/{}", a["id"]), &bob).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Author removes the whole subtree, even replies written by others.
    let (status, _) = app.delete(&format!("/api/comments/{}", a["id"]), &alice).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, post) = app.get(&format!("/api/posts/{id}"), &alice).await;
    let roots = post["comments"].as_array().expect("comments");
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0]["body"], "D");

    // Admins may delete anyone's comment.
    let (status, _) = app.delete(&format!("/api/comments/{}", d["id"]), &admin).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.delete(&format!("/api/comments/{}", d["id"]), &admin).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(app.store.comments_for_post(id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_comment_bodies_are_bad_requests() {
    let app = TestApp::new().await;
    let id = app.publish("First", "CivicLife").await;
    let user = app.register("fan", "Adult").await;

    for body in [
        json!({ "post_id": id }),
        json!({ "body": "hi", "post_id": "one" }),
        json!({ "body": "hi", "post_id": id, "parent_id": "root" }),
        json!([1, 2, 3]),
    ] {
        let (status, reply) = app.post_json("/api/comments", Some(&user), body.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert!(reply["error"].is_string(), "{reply}");
    }
    assert!(app.store.comments_for_post(id).await.unwrap().is_empty());
}
