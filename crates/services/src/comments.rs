//! # Comment Service
//!
//! Comment creation with reference validation, and cascading deletion of a
//! comment together with every reply beneath it.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use domains::comment_tree::{depth_of, parent_index};
use domains::policy::can_delete_comment;
use domains::{
    CommentDraft, CommentId, CommentNode, CommentRepo, DomainError, Identity, NewComment,
    PostRepo, Result, UserRepo,
};

use crate::render::{resolve, Renderer};
use crate::store_fault;

pub struct CommentService {
    posts: Arc<dyn PostRepo>,
    comments: Arc<dyn CommentRepo>,
    render: Renderer,
}

impl CommentService {
    pub fn new(
        posts: Arc<dyn PostRepo>,
        comments: Arc<dyn CommentRepo>,
        users: Arc<dyn UserRepo>,
    ) -> Self {
        Self {
            posts,
            comments: comments.clone(),
            render: Renderer { comments, users },
        }
    }

    /// Creates a comment on an existing post, optionally as a reply to a
    /// comment on that same post. Returns the stored comment with its depth.
    pub async fn create_comment(&self, draft: CommentDraft, author: &Identity) -> Result<CommentNode> {
        if author.user_id.trim().is_empty() {
            return Err(DomainError::Unauthenticated("no author identity".into()));
        }
        draft.validate()?;

        let post_exists = self
            .posts
            .get_post(draft.post_id)
            .await
            .map_err(store_fault("get post"))?
            .is_some();
        if !post_exists {
            warn!(post_id = draft.post_id, user = %author.username, "comment on missing post");
            return Err(DomainError::InvalidReference(format!(
                "post {} does not exist",
                draft.post_id
            )));
        }

        if let Some(parent_id) = draft.parent_id {
            let parent = self
                .comments
                .get_comment(parent_id)
                .await
                .map_err(store_fault("get parent comment"))?;
            match parent {
                Some(parent) if parent.post_id == draft.post_id => {}
                Some(parent) => {
                    warn!(
                        post_id = draft.post_id,
                        parent_id,
                        parent_post_id = parent.post_id,
                        user = %author.username,
                        "reply to a comment on another post"
                    );
                    return Err(DomainError::InvalidReference(format!(
                        "comment {parent_id} does not belong to post {}",
                        draft.post_id
                    )));
                }
                None => {
                    warn!(post_id = draft.post_id, parent_id, user = %author.username, "reply to missing comment");
                    return Err(DomainError::InvalidReference(format!(
                        "comment {parent_id} does not exist"
                    )));
                }
            }
        }

        let post_id = draft.post_id;
        let parent_id = draft.parent_id;
        let stored = self
            .comments
            .insert_comment(NewComment {
                body: draft.body,
                created_at: Utc::now(),
                post_id,
                author_id: author.user_id.clone(),
                parent_id,
            })
            .await
            .map_err(store_fault("insert comment"))?
            .ok_or_else(|| {
                warn!(post_id, ?parent_id, "post or parent vanished before insert");
                DomainError::InvalidReference("post or parent comment no longer exists".into())
            })?;

        let depth = self.depth(stored.id, post_id).await?;
        let names = self.render.names(vec![stored.author_id.clone()]).await?;
        let mut node = CommentNode::leaf(stored, depth);
        node.author_name = resolve(&names, Some(&node.author_id));

        info!(comment_id = node.id, post_id, ?parent_id, depth, user = %author.username, "comment created");
        Ok(node)
    }

    /// Deletes a comment and its whole reply subtree. Returns `false` when the
    /// comment is absent or the requester may not delete it; callers cannot
    /// tell the two apart.
    pub async fn delete_comment(&self, id: CommentId, requester: &Identity) -> Result<bool> {
        let Some(comment) = self
            .comments
            .get_comment(id)
            .await
            .map_err(store_fault("get comment"))?
        else {
            debug!(comment_id = id, "delete of missing comment");
            return Ok(false);
        };

        if !can_delete_comment(requester.role, &requester.user_id, &comment.author_id) {
            warn!(comment_id = id, user = %requester.username, role = %requester.role, "unauthorized comment delete attempt");
            return Ok(false);
        }

        let removed = self
            .comments
            .delete_comment_subtree(id)
            .await
            .map_err(store_fault("delete comment subtree"))?;
        if removed == 0 {
            debug!(comment_id = id, "comment vanished before delete");
            return Ok(false);
        }

        info!(comment_id = id, post_id = comment.post_id, removed, user = %requester.username, "comment subtree deleted");
        Ok(true)
    }

    /// Hops from the comment up to its thread root, over the post's full set.
    async fn depth(&self, id: CommentId, post_id: i64) -> Result<usize> {
        let thread = self
            .comments
            .comments_for_post(post_id)
            .await
            .map_err(store_fault("load comments"))?;
        depth_of(id, &parent_index(&thread)).ok_or_else(|| {
            error!(comment_id = id, post_id, "broken parent chain");
            DomainError::Store("broken parent chain".into())
        })
    }
}
