//! # SQLite store
//!
//! This module implements the data mapping between the SQLite relational model
//! and the `domains` models.

use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};
use uuid::Uuid;

use domains::{
    Category, Comment, CommentId, CommentRepo, NewComment, NewPost, NewUser, Post, PostDraft,
    PostId, PostRepo, User, UserId, UserRepo,
};

#[derive(Clone, Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens (creating if needed) the database at `url` and applies pending
    /// migrations.
    pub async fn connect(url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        // An in-memory database lives and dies with its connection, so keep
        // exactly one and never recycle it.
        let pool = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(max_connections)
                .connect_with(options)
                .await?
        };

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!(url, "sqlite store ready");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn row_to_post(row: &SqliteRow) -> Post {
    Post {
        id: row.get("id"),
        title: row.get("title"),
        body: row.get("body"),
        category: Category::from_code(row.get("category")),
        created_at: row.get("created_at"),
        creator_id: row.get("creator_id"),
    }
}

fn row_to_comment(row: &SqliteRow) -> Comment {
    Comment {
        id: row.get("id"),
        body: row.get("body"),
        created_at: row.get("created_at"),
        post_id: row.get("post_id"),
        author_id: row.get("author_id"),
        parent_id: row.get("parent_id"),
    }
}

fn row_to_user(row: &SqliteRow) -> anyhow::Result<User> {
    Ok(User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role: row.get::<String, _>("role").parse()?,
        age_group: row.get::<String, _>("age_group").parse()?,
    })
}

#[async_trait]
impl PostRepo for SqliteStore {
    async fn list_posts(&self) -> anyhow::Result<Vec<Post>> {
        let rows = sqlx::query("SELECT * FROM posts ORDER BY created_at DESC, id DESC")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(row_to_post).collect())
    }

    async fn get_post(&self, id: PostId) -> anyhow::Result<Option<Post>> {
        let row = sqlx::query("SELECT * FROM posts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_post))
    }

    async fn insert_post(&self, post: NewPost) -> anyhow::Result<Post> {
        let result = sqlx::query(
            "INSERT INTO posts (title, body, category, created_at, creator_id) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&post.draft.title)
        .bind(&post.draft.body)
        .bind(post.draft.category.code())
        .bind(post.created_at)
        .bind(&post.creator_id)
        .execute(&self.pool)
        .await?;

        Ok(Post {
            id: result.last_insert_rowid(),
            title: post.draft.title,
            body: post.draft.body,
            category: post.draft.category,
            created_at: post.created_at,
            creator_id: post.creator_id,
        })
    }

    async fn update_post(&self, id: PostId, draft: PostDraft) -> anyhow::Result<Option<Post>> {
        let result = sqlx::query("UPDATE posts SET title = ?, body = ?, category = ? WHERE id = ?")
            .bind(&draft.title)
            .bind(&draft.body)
            .bind(draft.category.code())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_post(id).await
    }

    /// Comments first, then the post, in one transaction.
    async fn delete_post(&self, id: PostId) -> anyhow::Result<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM comments WHERE post_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }
        tx.commit().await?;
        Ok(true)
    }
}

#[async_trait]
impl CommentRepo for SqliteStore {
    async fn comments_for_post(&self, post_id: PostId) -> anyhow::Result<Vec<Comment>> {
        let rows = sqlx::query("SELECT * FROM comments WHERE post_id = ? ORDER BY id ASC")
            .bind(post_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(row_to_comment).collect())
    }

    async fn get_comment(&self, id: CommentId) -> anyhow::Result<Option<Comment>> {
        let row = sqlx::query("SELECT * FROM comments WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_comment))
    }

    /// Re-validates the post and parent inside the insert's transaction so a
    /// concurrent delete cannot slip between the check and the write.
    async fn insert_comment(&self, comment: NewComment) -> anyhow::Result<Option<Comment>> {
        let mut tx = self.pool.begin().await?;

        let post: Option<i64> = sqlx::query_scalar("SELECT id FROM posts WHERE id = ?")
            .bind(comment.post_id)
            .fetch_optional(&mut *tx)
            .await?;
        if post.is_none() {
            return Ok(None);
        }

        if let Some(parent_id) = comment.parent_id {
            let parent_post: Option<i64> =
                sqlx::query_scalar("SELECT post_id FROM comments WHERE id = ?")
                    .bind(parent_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            if parent_post != Some(comment.post_id) {
                return Ok(None);
            }
        }

        let result = sqlx::query(
            "INSERT INTO comments (body, created_at, post_id, author_id, parent_id) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&comment.body)
        .bind(comment.created_at)
        .bind(comment.post_id)
        .bind(&comment.author_id)
        .bind(comment.parent_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(Comment {
            id: result.last_insert_rowid(),
            body: comment.body,
            created_at: comment.created_at,
            post_id: comment.post_id,
            author_id: comment.author_id,
            parent_id: comment.parent_id,
        }))
    }

    /// Collects the subtree and deletes it in one statement. Foreign keys are
    /// checked when the statement completes, by which point every reply has
    /// gone with its parent. `UNION` (not `UNION ALL`) stops on a corrupt
    /// parent cycle.
    async fn delete_comment_subtree(&self, root: CommentId) -> anyhow::Result<usize> {
        let result = sqlx::query(
            "WITH RECURSIVE subtree(id) AS (
                 SELECT id FROM comments WHERE id = ?
                 UNION
                 SELECT c.id FROM comments c JOIN subtree s ON c.parent_id = s.id
             )
             DELETE FROM comments WHERE id IN (SELECT id FROM subtree)",
        )
        .bind(root)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() as usize)
    }
}

#[async_trait]
impl UserRepo for SqliteStore {
    async fn insert_user(&self, user: NewUser) -> anyhow::Result<Option<User>> {
        let id = Uuid::new_v4().to_string();
        let result = sqlx::query(
            "INSERT INTO users (id, username, email, password_hash, role, age_group) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.age_group.as_str())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(Some(User {
                id,
                username: user.username,
                email: user.email,
                password_hash: user.password_hash,
                role: user.role,
                age_group: user.age_group,
            })),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_user).transpose()
    }

    async fn get_user(&self, id: &str) -> anyhow::Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_user).transpose()
    }

    async fn display_names(&self, ids: &[UserId]) -> anyhow::Result<HashMap<UserId, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let mut query = QueryBuilder::<Sqlite>::new("SELECT id, username FROM users WHERE id IN (");
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(")");

        let rows = query.build().fetch_all(&self.pool).await?;
        Ok(rows
            .into_iter()
            .map(|row| (row.get("id"), row.get("username")))
            .collect())
    }
}
