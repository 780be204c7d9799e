//! Comment persistence operations.
//!
//! All functions take a `&PgPool` and operate on the `comments` and
//! `comment_likes` tables. The reply target is resolved with a self join,
//! so a reply whose target was deleted reads back with no reply fields.

use chrono::{DateTime, Utc};
use murmur_core::{CommentId, IdentityId, PaginationPlan, PostId};
use sqlx::PgPool;
use uuid::Uuid;

use super::{contains_pattern, order_by};
use crate::model::Comment;

/// Select list for a comment as seen by the viewer bound to `$1`.
const COMMENT_COLUMNS: &str = "c.id, c.post, c.author, c.content, c.created_at,
    (SELECT COUNT(*) FROM comment_likes l WHERE l.comment = c.id) AS likes_count,
    EXISTS (SELECT 1 FROM comment_likes l WHERE l.comment = c.id AND l.author = $1) AS is_liked,
    r.id AS reply_comment_id, r.author AS reply_comment_author";

#[derive(Debug, sqlx::FromRow)]
struct CommentRow {
    id: i32,
    post: i32,
    author: Uuid,
    content: String,
    created_at: DateTime<Utc>,
    likes_count: i64,
    is_liked: bool,
    reply_comment_id: Option<i32>,
    reply_comment_author: Option<Uuid>,
}

impl CommentRow {
    fn into_comment(self) -> Comment {
        Comment {
            id: CommentId(self.id),
            post: PostId(self.post),
            author: IdentityId::from_uuid(self.author),
            content: self.content,
            created_at: self.created_at,
            likes_count: self.likes_count,
            is_liked: self.is_liked,
            reply_comment_id: self.reply_comment_id.map(CommentId),
            reply_comment_author: self.reply_comment_author.map(IdentityId::from_uuid),
        }
    }
}

/// One page of comments under `post` for `viewer`.
pub async fn list(
    pool: &PgPool,
    post: PostId,
    viewer: IdentityId,
    plan: &PaginationPlan,
) -> Result<Vec<Comment>, sqlx::Error> {
    let sql = format!(
        "SELECT {COMMENT_COLUMNS} FROM comments c
         LEFT JOIN comments r ON r.id = c.reply
         WHERE c.post = $2 AND ($3::TEXT IS NULL OR c.content ILIKE $3)
         ORDER BY {}
         LIMIT $4 OFFSET $5",
        order_by(plan.sort(), "c")
    );

    let rows = sqlx::query_as::<_, CommentRow>(&sql)
        .bind(viewer.as_uuid())
        .bind(post.0)
        .bind(plan.search().map(contains_pattern))
        .bind(plan.limit())
        .bind(plan.offset())
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(CommentRow::into_comment).collect())
}

/// Fetch a single comment for `viewer`.
pub async fn get_by_id(
    pool: &PgPool,
    id: CommentId,
    viewer: IdentityId,
) -> Result<Option<Comment>, sqlx::Error> {
    let sql = format!(
        "SELECT {COMMENT_COLUMNS} FROM comments c
         LEFT JOIN comments r ON r.id = c.reply
         WHERE c.id = $2"
    );

    let row = sqlx::query_as::<_, CommentRow>(&sql)
        .bind(viewer.as_uuid())
        .bind(id.0)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(CommentRow::into_comment))
}

/// Post a comment belongs to, if it exists.
pub async fn post_of(pool: &PgPool, id: CommentId) -> Result<Option<PostId>, sqlx::Error> {
    let post: Option<i32> = sqlx::query_scalar("SELECT post FROM comments WHERE id = $1")
        .bind(id.0)
        .fetch_optional(pool)
        .await?;

    Ok(post.map(PostId))
}

/// Insert a comment and return its id. A missing post surfaces as a
/// foreign key violation.
pub async fn insert(
    pool: &PgPool,
    post: PostId,
    author: IdentityId,
    content: &str,
    reply: Option<CommentId>,
) -> Result<CommentId, sqlx::Error> {
    let id: i32 = sqlx::query_scalar(
        "INSERT INTO comments (post, author, content, reply)
         VALUES ($1, $2, $3, $4)
         RETURNING id",
    )
    .bind(post.0)
    .bind(author.as_uuid())
    .bind(content)
    .bind(reply.map(|r| r.0))
    .fetch_one(pool)
    .await?;

    Ok(CommentId(id))
}

/// Author of a comment, if it exists.
pub async fn author(pool: &PgPool, id: CommentId) -> Result<Option<IdentityId>, sqlx::Error> {
    let author: Option<Uuid> = sqlx::query_scalar("SELECT author FROM comments WHERE id = $1")
        .bind(id.0)
        .fetch_optional(pool)
        .await?;

    Ok(author.map(IdentityId::from_uuid))
}

/// Delete a comment; its likes cascade and replies to it lose their target.
pub async fn delete(pool: &PgPool, id: CommentId) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM comments WHERE id = $1")
        .bind(id.0)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Record a like; repeated likes are no-ops.
pub async fn like(pool: &PgPool, id: CommentId, author: IdentityId) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO comment_likes (comment, author) VALUES ($1, $2)
         ON CONFLICT (comment, author) DO NOTHING",
    )
    .bind(id.0)
    .bind(author.as_uuid())
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn unlike(pool: &PgPool, id: CommentId, author: IdentityId) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM comment_likes WHERE comment = $1 AND author = $2")
        .bind(id.0)
        .bind(author.as_uuid())
        .execute(pool)
        .await?;

    Ok(())
}
