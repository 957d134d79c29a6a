//! # Core Traits (Ports)
//!
//! Any adapter must implement these traits to be used by the binary.
//! Repository ports return `anyhow::Result`; services translate failures
//! into [`DomainError`](crate::DomainError) at their boundary.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::Result;
use crate::identity::{Claims, Registration};
use crate::models::{
    Comment, CommentId, NewComment, NewPost, NewUser, Post, PostDraft, PostId, User, UserId,
};

/// Data persistence contract for posts.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PostRepo: Send + Sync {
    /// Every post, newest `created_at` first.
    async fn list_posts(&self) -> anyhow::Result<Vec<Post>>;
    async fn get_post(&self, id: PostId) -> anyhow::Result<Option<Post>>;
    async fn insert_post(&self, post: NewPost) -> anyhow::Result<Post>;
    /// Replaces title, body and category. `None` if the post is absent.
    async fn update_post(&self, id: PostId, draft: PostDraft) -> anyhow::Result<Option<Post>>;
    /// Removes the post together with all of its comments in one atomic unit.
    /// Returns `false` if the post is absent.
    async fn delete_post(&self, id: PostId) -> anyhow::Result<bool>;
}

/// Data persistence contract for comments.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CommentRepo: Send + Sync {
    /// The complete comment set of a post, in creation order.
    async fn comments_for_post(&self, post_id: PostId) -> anyhow::Result<Vec<Comment>>;
    async fn get_comment(&self, id: CommentId) -> anyhow::Result<Option<Comment>>;

    /// Inserts a comment after re-checking, within the same atomic unit, that
    /// the post exists and that the parent (if any) belongs to that post.
    /// Returns `None` when either reference no longer holds.
    async fn insert_comment(&self, comment: NewComment) -> anyhow::Result<Option<Comment>>;

    /// Deletes `root` and every reply beneath it. The subtree is collected
    /// and removed within one atomic unit, so a reply added concurrently is
    /// either removed with it or rejected by the guarded insert.
    /// Returns how many comments were removed (0 if `root` is absent).
    async fn delete_comment_subtree(&self, root: CommentId) -> anyhow::Result<usize>;
}

/// Account persistence contract used by the identity adapter and for
/// display-name resolution.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepo: Send + Sync {
    /// `None` when the username is already taken.
    async fn insert_user(&self, user: NewUser) -> anyhow::Result<Option<User>>;
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>>;
    async fn get_user(&self, id: &str) -> anyhow::Result<Option<User>>;
    /// Usernames for the given ids. Unknown ids are simply absent from the map.
    async fn display_names(&self, ids: &[UserId]) -> anyhow::Result<HashMap<UserId, String>>;
}

/// Credential contract: account creation and password verification.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn create_account(&self, registration: Registration) -> Result<User>;
    async fn verify_credentials(&self, username: &str, password: &str) -> Result<User>;
}

/// Bearer token contract.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait TokenService: Send + Sync {
    fn issue_token(&self, user: &User) -> Result<String>;
    fn verify_token(&self, token: &str) -> Result<Claims>;
}
