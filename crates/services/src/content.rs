//! # Content Service
//!
//! Post retrieval and management. Listing silently drops posts the requester
//! may not see; single lookups report them exactly like missing posts so that
//! existence never leaks to an unauthorized age group.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use domains::policy::{can_create_post, can_delete_post, can_edit_post, is_visible_to};
use domains::{
    CommentRepo, DomainError, Identity, NewPost, PostDraft, PostId, PostRepo, PostView, Result,
    UserRepo,
};

use crate::render::Renderer;
use crate::store_fault;

pub struct ContentService {
    posts: Arc<dyn PostRepo>,
    render: Renderer,
}

impl ContentService {
    pub fn new(
        posts: Arc<dyn PostRepo>,
        comments: Arc<dyn CommentRepo>,
        users: Arc<dyn UserRepo>,
    ) -> Self {
        Self {
            posts,
            render: Renderer { comments, users },
        }
    }

    /// Posts visible to the requester, newest first, each with its comment
    /// forest. Admins receive every post.
    pub async fn list_posts(&self, requester: &Identity) -> Result<Vec<PostView>> {
        let mut posts = self.posts.list_posts().await.map_err(store_fault("list posts"))?;
        let total = posts.len();
        posts.retain(|p| is_visible_to(p.category, requester.role, requester.age_group));
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        debug!(
            user = %requester.username,
            role = %requester.role,
            total,
            visible = posts.len(),
            "listing posts"
        );

        let mut views = Vec::with_capacity(posts.len());
        for post in posts {
            views.push(self.render.post(post).await?);
        }
        Ok(views)
    }

    /// A single post. Absent and invisible posts both yield `NotFound`.
    pub async fn get_post(&self, id: PostId, requester: &Identity) -> Result<PostView> {
        let post = self
            .posts
            .get_post(id)
            .await
            .map_err(store_fault("get post"))?
            .filter(|p| is_visible_to(p.category, requester.role, requester.age_group));

        match post {
            Some(post) => self.render.post(post).await,
            None => {
                debug!(post_id = id, user = %requester.username, "post not found or not visible");
                Err(DomainError::not_found("post", id))
            }
        }
    }

    pub async fn create_post(&self, draft: PostDraft, requester: &Identity) -> Result<PostView> {
        if !can_create_post(requester.role) {
            warn!(user = %requester.username, role = %requester.role, "unauthorized post create attempt");
            return Err(DomainError::Forbidden("only administrators can create posts".into()));
        }
        draft.validate()?;

        let post = self
            .posts
            .insert_post(NewPost {
                draft,
                created_at: Utc::now(),
                creator_id: Some(requester.user_id.clone()),
            })
            .await
            .map_err(store_fault("insert post"))?;

        info!(post_id = post.id, user = %requester.username, title = %post.title, "post created");
        self.render.post(post).await
    }

    /// Replaces title, body and category. Creation time and creator stay.
    pub async fn update_post(
        &self,
        id: PostId,
        draft: PostDraft,
        requester: &Identity,
    ) -> Result<PostView> {
        if !can_edit_post(requester.role) {
            warn!(post_id = id, user = %requester.username, role = %requester.role, "unauthorized post edit attempt");
            return Err(DomainError::Forbidden("only administrators can update posts".into()));
        }
        draft.validate()?;

        let Some(post) = self
            .posts
            .update_post(id, draft)
            .await
            .map_err(store_fault("update post"))?
        else {
            return Err(DomainError::not_found("post", id));
        };

        info!(post_id = id, user = %requester.username, "post updated");
        self.render.post(post).await
    }

    /// Removes the post and every comment on it. `false` if it was absent.
    pub async fn delete_post(&self, id: PostId, requester: &Identity) -> Result<bool> {
        if !can_delete_post(requester.role) {
            warn!(post_id = id, user = %requester.username, role = %requester.role, "unauthorized post delete attempt");
            return Err(DomainError::Forbidden("only administrators can delete posts".into()));
        }

        let deleted = self.posts.delete_post(id).await.map_err(store_fault("delete post"))?;
        if deleted {
            info!(post_id = id, user = %requester.username, "post deleted");
        }
        Ok(deleted)
    }
}
