//! Turns stored records into client projections.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use domains::comment_tree::build_tree;
use domains::{
    Comment, CommentNode, CommentRepo, Post, PostView, Result, UserId, UserRepo,
    UNKNOWN_DISPLAY_NAME,
};

use crate::store_fault;

pub(crate) struct Renderer {
    pub comments: Arc<dyn CommentRepo>,
    pub users: Arc<dyn UserRepo>,
}

impl Renderer {
    /// Loads the post's complete comment set and renders it with the post.
    pub async fn post(&self, post: Post) -> Result<PostView> {
        let comments = self
            .comments
            .comments_for_post(post.id)
            .await
            .map_err(store_fault("load comments"))?;

        let mut wanted: HashSet<UserId> = comments.iter().map(|c| c.author_id.clone()).collect();
        wanted.extend(post.creator_id.clone());
        let names = self.names(wanted.into_iter().collect()).await?;

        let comments = thread(post.id, comments, &names);
        let creator_name = resolve(&names, post.creator_id.as_deref());

        Ok(PostView {
            id: post.id,
            title: post.title,
            body: post.body,
            category: post.category,
            created_at: post.created_at,
            creator_name,
            comments,
        })
    }

    pub async fn names(&self, ids: Vec<UserId>) -> Result<HashMap<UserId, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        self.users
            .display_names(&ids)
            .await
            .map_err(store_fault("resolve display names"))
    }
}

/// Display name for `id`, or the sentinel when absent or unresolved.
pub(crate) fn resolve(names: &HashMap<UserId, String>, id: Option<&str>) -> String {
    id.and_then(|id| names.get(id))
        .filter(|name| !name.trim().is_empty())
        .cloned()
        .unwrap_or_else(|| UNKNOWN_DISPLAY_NAME.to_string())
}

fn thread(post_id: i64, comments: Vec<Comment>, names: &HashMap<UserId, String>) -> Vec<CommentNode> {
    let mut tree = build_tree(comments);
    if !tree.is_consistent() {
        let orphan_ids: Vec<_> = tree.orphans.iter().map(|c| c.id).collect();
        tracing::error!(post_id, ?orphan_ids, "comments unreachable from any root");
    }
    for root in tree.roots.iter_mut() {
        root.for_each_mut(|node| node.author_name = resolve(names, Some(&node.author_id)));
    }
    tree.roots
}
