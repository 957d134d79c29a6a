//! # Domain Models
//!
//! These structs represent the core entities of gatepost.
//! Posts and comments carry store-assigned integer ids; users carry an
//! opaque string id minted by the identity adapter.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type PostId = i64;
pub type CommentId = i64;
pub type UserId = String;

/// Longest title a post may carry, in characters.
pub const MAX_TITLE_CHARS: usize = 200;

/// Shown wherever a creator or author cannot be resolved.
pub const UNKNOWN_DISPLAY_NAME: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Standard,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Standard => "Standard",
            Role::Admin => "Admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Role::Standard),
            "admin" => Ok(Role::Admin),
            _ => Err(UnknownVariant(s.to_string())),
        }
    }
}

/// A user's fixed age bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgeGroup {
    Child,
    Adult,
    Senior,
}

impl AgeGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgeGroup::Child => "Child",
            AgeGroup::Adult => "Adult",
            AgeGroup::Senior => "Senior",
        }
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgeGroup {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "child" => Ok(AgeGroup::Child),
            "adult" => Ok(AgeGroup::Adult),
            "senior" => Ok(AgeGroup::Senior),
            _ => Err(UnknownVariant(s.to_string())),
        }
    }
}

/// Content classification of a post. Drives age-based visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Child,
    CivicLife,
    Sport,
    /// Anything the store holds that this build does not recognise.
    #[serde(other)]
    Unknown,
}

impl Category {
    /// Integer code used by the persistence layer.
    pub fn code(&self) -> i64 {
        match self {
            Category::Child => 0,
            Category::CivicLife => 1,
            Category::Sport => 2,
            Category::Unknown => -1,
        }
    }

    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Category::Child,
            1 => Category::CivicLife,
            2 => Category::Sport,
            _ => Category::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognised value {:?}", self.0)
    }
}

impl std::error::Error for UnknownVariant {}

/// A registered account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    /// Argon2 PHC string. Never leaves the server.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub age_group: AgeGroup,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub body: String,
    pub category: Category,
    pub created_at: DateTime<Utc>,
    pub creator_id: Option<UserId>,
}

/// A comment as stored: flat, linked to its parent by id only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub post_id: PostId,
    pub author_id: UserId,
    pub parent_id: Option<CommentId>,
}

/// Editable fields of a post, used for both creation and update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDraft {
    pub title: String,
    pub body: String,
    pub category: Category,
}

/// Caller-supplied fields of a new comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentDraft {
    pub body: String,
    pub post_id: PostId,
    #[serde(default)]
    pub parent_id: Option<CommentId>,
}

/// What the store receives when a post is inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPost {
    pub draft: PostDraft,
    pub created_at: DateTime<Utc>,
    pub creator_id: Option<UserId>,
}

/// What the store receives when a comment is inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewComment {
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub post_id: PostId,
    pub author_id: UserId,
    pub parent_id: Option<CommentId>,
}

/// What the store receives when an account is created.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub age_group: AgeGroup,
}

/// A post as returned to clients, with its comment forest rendered.
///
/// Not `Serialize`: threads nest without bound, and transports encode
/// views with an explicit stack.
#[derive(Debug, Clone, PartialEq)]
pub struct PostView {
    pub id: PostId,
    pub title: String,
    pub body: String,
    pub category: Category,
    pub created_at: DateTime<Utc>,
    pub creator_name: String,
    pub comments: Vec<CommentNode>,
}

/// One node of a rendered comment thread.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentNode {
    pub id: CommentId,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub author_id: UserId,
    pub author_name: String,
    pub parent_id: Option<CommentId>,
    pub depth: usize,
    pub replies: Vec<CommentNode>,
}

impl CommentNode {
    /// A leaf node; `author_name` is filled in by the caller.
    pub fn leaf(comment: Comment, depth: usize) -> Self {
        Self {
            id: comment.id,
            body: comment.body,
            created_at: comment.created_at,
            author_id: comment.author_id,
            author_name: UNKNOWN_DISPLAY_NAME.to_string(),
            parent_id: comment.parent_id,
            depth,
            replies: Vec::new(),
        }
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn subtree_size(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.replies.iter());
        }
        count
    }

    /// Applies `f` to every node of the subtree, parents before replies.
    pub fn for_each_mut(&mut self, mut f: impl FnMut(&mut CommentNode)) {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            f(node);
            stack.extend(node.replies.iter_mut());
        }
    }
}

impl Drop for CommentNode {
    // Unlinks replies onto a heap stack so deep threads never recurse on drop.
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.replies);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.replies);
        }
    }
}

impl PostDraft {
    /// Title and body must carry text, the title fits in
    /// [`MAX_TITLE_CHARS`], and the category is one this build knows.
    pub fn validate(&self) -> crate::Result<()> {
        if self.title.trim().is_empty() {
            return Err(crate::DomainError::Validation("title is required".into()));
        }
        if self.title.chars().count() > MAX_TITLE_CHARS {
            return Err(crate::DomainError::Validation(format!(
                "title must be at most {MAX_TITLE_CHARS} characters"
            )));
        }
        if self.body.trim().is_empty() {
            return Err(crate::DomainError::Validation("body is required".into()));
        }
        if self.category == Category::Unknown {
            return Err(crate::DomainError::Validation("unrecognised category".into()));
        }
        Ok(())
    }
}

impl CommentDraft {
    pub fn validate(&self) -> crate::Result<()> {
        if self.body.trim().is_empty() {
            return Err(crate::DomainError::Validation("comment body is required".into()));
        }
        Ok(())
    }
}
