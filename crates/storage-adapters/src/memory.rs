//! In-process implementation of every repository port.
//!
//! All state sits behind one `RwLock`; each port call holds the guard for its
//! whole duration, so multi-step operations (guarded insert, subtree delete,
//! post cascade) are atomic with respect to other callers.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use domains::comment_tree::deletion_order;
use domains::{
    Comment, CommentId, CommentRepo, NewComment, NewPost, NewUser, Post, PostDraft, PostId,
    PostRepo, User, UserId, UserRepo,
};

#[derive(Default)]
struct State {
    posts: BTreeMap<PostId, Post>,
    comments: BTreeMap<CommentId, Comment>,
    users: HashMap<UserId, User>,
    last_post_id: PostId,
    last_comment_id: CommentId,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PostRepo for MemoryStore {
    async fn list_posts(&self) -> anyhow::Result<Vec<Post>> {
        let state = self.state.read().await;
        let mut posts: Vec<Post> = state.posts.values().cloned().collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(posts)
    }

    async fn get_post(&self, id: PostId) -> anyhow::Result<Option<Post>> {
        Ok(self.state.read().await.posts.get(&id).cloned())
    }

    async fn insert_post(&self, post: NewPost) -> anyhow::Result<Post> {
        let mut state = self.state.write().await;
        state.last_post_id += 1;
        let post = Post {
            id: state.last_post_id,
            title: post.draft.title,
            body: post.draft.body,
            category: post.draft.category,
            created_at: post.created_at,
            creator_id: post.creator_id,
        };
        state.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn update_post(&self, id: PostId, draft: PostDraft) -> anyhow::Result<Option<Post>> {
        let mut state = self.state.write().await;
        Ok(state.posts.get_mut(&id).map(|post| {
            post.title = draft.title;
            post.body = draft.body;
            post.category = draft.category;
            post.clone()
        }))
    }

    async fn delete_post(&self, id: PostId) -> anyhow::Result<bool> {
        let mut state = self.state.write().await;
        if state.posts.remove(&id).is_none() {
            return Ok(false);
        }
        state.comments.retain(|_, c| c.post_id != id);
        Ok(true)
    }
}

#[async_trait]
impl CommentRepo for MemoryStore {
    async fn comments_for_post(&self, post_id: PostId) -> anyhow::Result<Vec<Comment>> {
        let state = self.state.read().await;
        Ok(state
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect())
    }

    async fn get_comment(&self, id: CommentId) -> anyhow::Result<Option<Comment>> {
        Ok(self.state.read().await.comments.get(&id).cloned())
    }

    async fn insert_comment(&self, comment: NewComment) -> anyhow::Result<Option<Comment>> {
        let mut state = self.state.write().await;
        if !state.posts.contains_key(&comment.post_id) {
            return Ok(None);
        }
        if let Some(parent_id) = comment.parent_id {
            match state.comments.get(&parent_id) {
                Some(parent) if parent.post_id == comment.post_id => {}
                _ => return Ok(None),
            }
        }

        state.last_comment_id += 1;
        let comment = Comment {
            id: state.last_comment_id,
            body: comment.body,
            created_at: comment.created_at,
            post_id: comment.post_id,
            author_id: comment.author_id,
            parent_id: comment.parent_id,
        };
        state.comments.insert(comment.id, comment.clone());
        Ok(Some(comment))
    }

    async fn delete_comment_subtree(&self, root: CommentId) -> anyhow::Result<usize> {
        let mut state = self.state.write().await;
        let Some(post_id) = state.comments.get(&root).map(|c| c.post_id) else {
            return Ok(0);
        };
        let thread: Vec<Comment> = state
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        Ok(deletion_order(root, &thread)
            .iter()
            .filter(|id| state.comments.remove(*id).is_some())
            .count())
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> anyhow::Result<Option<User>> {
        let mut state = self.state.write().await;
        if state.users.values().any(|u| u.username == user.username) {
            return Ok(None);
        }
        let user = User {
            id: Uuid::new_v4().to_string(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            age_group: user.age_group,
        };
        state.users.insert(user.id.clone(), user.clone());
        Ok(Some(user))
    }

    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.username == username).cloned())
    }

    async fn get_user(&self, id: &str) -> anyhow::Result<Option<User>> {
        Ok(self.state.read().await.users.get(id).cloned())
    }

    async fn display_names(&self, ids: &[UserId]) -> anyhow::Result<HashMap<UserId, String>> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.users.get(id).map(|u| (id.clone(), u.username.clone())))
            .collect())
    }
}
