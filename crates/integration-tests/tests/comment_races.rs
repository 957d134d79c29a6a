//! A writer keeps adding replies to a thread while its root is being
//! deleted; the delete must still take the whole subtree.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use domains::{
    AgeGroup, Category, Comment, CommentId, CommentRepo, Identity, NewComment, NewPost, PostDraft,
    PostId, PostRepo, Role,
};
use services::CommentService;
use storage_adapters::MemoryStore;

/// Delegates to a [`MemoryStore`], and after every read commits one more
/// reply at the bottom of the chain it is tracking.
struct BusyThread {
    inner: MemoryStore,
    post_id: PostId,
    deepest: Mutex<CommentId>,
}

impl BusyThread {
    async fn append_reply(&self) -> anyhow::Result<()> {
        let mut deepest = self.deepest.lock().await;
        let reply = self
            .inner
            .insert_comment(NewComment {
                body: "late reply".into(),
                created_at: Utc::now(),
                post_id: self.post_id,
                author_id: "u2".into(),
                parent_id: Some(*deepest),
            })
            .await?;
        if let Some(reply) = reply {
            *deepest = reply.id;
        }
        Ok(())
    }
}

#[async_trait]
impl CommentRepo for BusyThread {
    async fn comments_for_post(&self, post_id: PostId) -> anyhow::Result<Vec<Comment>> {
        let comments = self.inner.comments_for_post(post_id).await?;
        self.append_reply().await?;
        Ok(comments)
    }

    async fn get_comment(&self, id: CommentId) -> anyhow::Result<Option<Comment>> {
        let comment = self.inner.get_comment(id).await?;
        self.append_reply().await?;
        Ok(comment)
    }

    async fn insert_comment(&self, comment: NewComment) -> anyhow::Result<Option<Comment>> {
        self.inner.insert_comment(comment).await
    }

    async fn delete_comment_subtree(&self, root: CommentId) -> anyhow::Result<usize> {
        self.inner.delete_comment_subtree(root).await
    }
}

fn comment(post_id: PostId, author: &str, parent_id: Option<CommentId>) -> NewComment {
    NewComment {
        body: "text".into(),
        created_at: Utc::now(),
        post_id,
        author_id: author.into(),
        parent_id,
    }
}

#[tokio::test]
async fn test_replies_added_during_delete_are_removed_with_the_subtree() {
    let store = MemoryStore::new();
    let post = store
        .insert_post(NewPost {
            draft: PostDraft {
                title: "Town hall".into(),
                body: "Agenda".into(),
                category: Category::CivicLife,
            },
            created_at: Utc::now(),
            creator_id: None,
        })
        .await
        .unwrap();
    let root = store.insert_comment(comment(post.id, "u1", None)).await.unwrap().unwrap();
    let reply = store
        .insert_comment(comment(post.id, "u2", Some(root.id)))
        .await
        .unwrap()
        .unwrap();
    let other = store.insert_comment(comment(post.id, "u3", None)).await.unwrap().unwrap();

    let busy = BusyThread {
        inner: store.clone(),
        post_id: post.id,
        deepest: Mutex::new(reply.id),
    };
    let service = CommentService::new(Arc::new(store.clone()), Arc::new(busy), Arc::new(store.clone()));
    let author = Identity {
        user_id: "u1".into(),
        username: "alice".into(),
        role: Role::Standard,
        age_group: Some(AgeGroup::Adult),
    };

    assert!(service.delete_comment(root.id, &author).await.unwrap());

    let left: Vec<_> = store
        .comments_for_post(post.id)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(left, vec![other.id]);
}
