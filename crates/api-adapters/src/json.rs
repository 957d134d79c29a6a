//! Response encoding for rendered posts and comment threads.
//!
//! Reply chains nest without bound, so threads are written with an explicit
//! work-list instead of a recursive `Serialize`. Scalar fields still go
//! through `serde_json`, which keeps escaping and timestamp formats the same
//! as every other response.

use axum::http::header::CONTENT_TYPE;
use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::error;

use domains::{Category, CommentId, CommentNode, DomainError, PostId, PostView};

use crate::error::ApiError;

/// A JSON response body for post and comment views.
pub struct ThreadJson<T>(pub T);

pub trait WriteJson {
    fn write_json(&self, out: &mut Vec<u8>) -> serde_json::Result<()>;
}

impl<T: WriteJson> IntoResponse for ThreadJson<T> {
    fn into_response(self) -> Response {
        let mut body = Vec::new();
        match self.0.write_json(&mut body) {
            Ok(()) => (
                [(CONTENT_TYPE, HeaderValue::from_static("application/json"))],
                body,
            )
                .into_response(),
            Err(e) => {
                error!(error = %e, "response encoding failed");
                ApiError(DomainError::Store("encode response".into())).into_response()
            }
        }
    }
}

#[derive(Serialize)]
struct PostFields<'a> {
    id: PostId,
    title: &'a str,
    body: &'a str,
    category: Category,
    created_at: &'a DateTime<Utc>,
    creator_name: &'a str,
}

#[derive(Serialize)]
struct NodeFields<'a> {
    id: CommentId,
    body: &'a str,
    created_at: &'a DateTime<Utc>,
    author_id: &'a str,
    author_name: &'a str,
    parent_id: Option<CommentId>,
    depth: usize,
}

impl<'a> From<&'a CommentNode> for NodeFields<'a> {
    fn from(node: &'a CommentNode) -> Self {
        Self {
            id: node.id,
            body: &node.body,
            created_at: &node.created_at,
            author_id: &node.author_id,
            author_name: &node.author_name,
            parent_id: node.parent_id,
            depth: node.depth,
        }
    }
}

/// Writes `fields` as an object that is left open after a trailing
/// `,"key":`, ready for a nested value and the closing brace.
fn open_object<T: Serialize>(out: &mut Vec<u8>, fields: &T, key: &str) -> serde_json::Result<()> {
    serde_json::to_writer(&mut *out, fields)?;
    // Compact output of a non-empty struct ends with `}`.
    out.pop();
    out.push(b',');
    serde_json::to_writer(&mut *out, key)?;
    out.push(b':');
    Ok(())
}

enum Step<'a> {
    Node(&'a CommentNode),
    Comma,
    Close,
}

/// Pushed in reverse so that popping yields the siblings in order.
fn push_siblings<'a>(stack: &mut Vec<Step<'a>>, nodes: &'a [CommentNode]) {
    for (i, node) in nodes.iter().enumerate().rev() {
        stack.push(Step::Node(node));
        if i > 0 {
            stack.push(Step::Comma);
        }
    }
}

fn drain(out: &mut Vec<u8>, mut stack: Vec<Step<'_>>) -> serde_json::Result<()> {
    while let Some(step) = stack.pop() {
        match step {
            Step::Comma => out.push(b','),
            Step::Close => out.extend_from_slice(b"]}"),
            Step::Node(node) => {
                open_object(out, &NodeFields::from(node), "replies")?;
                out.push(b'[');
                stack.push(Step::Close);
                push_siblings(&mut stack, &node.replies);
            }
        }
    }
    Ok(())
}

fn write_forest(out: &mut Vec<u8>, roots: &[CommentNode]) -> serde_json::Result<()> {
    out.push(b'[');
    let mut stack = Vec::new();
    push_siblings(&mut stack, roots);
    drain(out, stack)?;
    out.push(b']');
    Ok(())
}

impl WriteJson for CommentNode {
    fn write_json(&self, out: &mut Vec<u8>) -> serde_json::Result<()> {
        drain(out, vec![Step::Node(self)])
    }
}

impl WriteJson for PostView {
    fn write_json(&self, out: &mut Vec<u8>) -> serde_json::Result<()> {
        let fields = PostFields {
            id: self.id,
            title: &self.title,
            body: &self.body,
            category: self.category,
            created_at: &self.created_at,
            creator_name: &self.creator_name,
        };
        open_object(out, &fields, "comments")?;
        write_forest(out, &self.comments)?;
        out.push(b'}');
        Ok(())
    }
}

impl WriteJson for Vec<PostView> {
    fn write_json(&self, out: &mut Vec<u8>) -> serde_json::Result<()> {
        out.push(b'[');
        for (i, post) in self.iter().enumerate() {
            if i > 0 {
                out.push(b',');
            }
            post.write_json(out)?;
        }
        out.push(b']');
        Ok(())
    }
}
