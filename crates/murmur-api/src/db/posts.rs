//! Post persistence operations.
//!
//! All functions take a `&PgPool` and operate on the `posts` and
//! `post_likes` tables.

use chrono::{DateTime, Utc};
use murmur_core::{IdentityId, PaginationPlan, PostId};
use sqlx::PgPool;
use uuid::Uuid;

use super::{contains_pattern, order_by};
use crate::model::Post;

/// Select list for a post as seen by the viewer bound to `$1`.
const POST_COLUMNS: &str = "p.id, p.author, p.created_at, p.content,
    (SELECT COUNT(*) FROM post_likes l WHERE l.post = p.id) AS likes_count,
    (SELECT COUNT(*) FROM comments c WHERE c.post = p.id) AS comments_count,
    EXISTS (SELECT 1 FROM post_likes l WHERE l.post = p.id AND l.author = $1) AS is_liked";

#[derive(Debug, sqlx::FromRow)]
struct PostRow {
    id: i32,
    author: Uuid,
    created_at: DateTime<Utc>,
    content: String,
    likes_count: i64,
    comments_count: i64,
    is_liked: bool,
}

impl PostRow {
    fn into_post(self) -> Post {
        Post {
            id: PostId(self.id),
            author: IdentityId::from_uuid(self.author),
            created_at: self.created_at,
            content: self.content,
            likes_count: self.likes_count,
            comments_count: self.comments_count,
            is_liked: self.is_liked,
        }
    }
}

/// One page of posts for `viewer` according to `plan`.
pub async fn list(
    pool: &PgPool,
    viewer: IdentityId,
    plan: &PaginationPlan,
) -> Result<Vec<Post>, sqlx::Error> {
    let sql = format!(
        "SELECT {POST_COLUMNS} FROM posts p
         WHERE ($2::TEXT IS NULL OR p.content ILIKE $2)
         ORDER BY {}
         LIMIT $3 OFFSET $4",
        order_by(plan.sort(), "p")
    );

    let rows = sqlx::query_as::<_, PostRow>(&sql)
        .bind(viewer.as_uuid())
        .bind(plan.search().map(contains_pattern))
        .bind(plan.limit())
        .bind(plan.offset())
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(PostRow::into_post).collect())
}

/// Insert a post and return it with zero counts.
pub async fn insert(pool: &PgPool, author: IdentityId, content: &str) -> Result<Post, sqlx::Error> {
    let row = sqlx::query_as::<_, PostRow>(
        "INSERT INTO posts (author, content) VALUES ($1, $2)
         RETURNING id, author, created_at, content,
         0::BIGINT AS likes_count, 0::BIGINT AS comments_count, FALSE AS is_liked",
    )
    .bind(author.as_uuid())
    .bind(content)
    .fetch_one(pool)
    .await?;

    Ok(row.into_post())
}

/// Author of a post, if it exists.
pub async fn author(pool: &PgPool, id: PostId) -> Result<Option<IdentityId>, sqlx::Error> {
    let author: Option<Uuid> = sqlx::query_scalar("SELECT author FROM posts WHERE id = $1")
        .bind(id.0)
        .fetch_optional(pool)
        .await?;

    Ok(author.map(IdentityId::from_uuid))
}

/// Delete a post. Comments and likes go with it via `ON DELETE CASCADE`.
pub async fn delete(pool: &PgPool, id: PostId) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM posts WHERE id = $1")
        .bind(id.0)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Record a like. A repeated like is a no-op; a missing post surfaces as a
/// foreign key violation.
pub async fn like(pool: &PgPool, id: PostId, author: IdentityId) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO post_likes (post, author) VALUES ($1, $2)
         ON CONFLICT (post, author) DO NOTHING",
    )
    .bind(id.0)
    .bind(author.as_uuid())
    .execute(pool)
    .await?;

    Ok(())
}

/// Remove a like if present.
pub async fn unlike(pool: &PgPool, id: PostId, author: IdentityId) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM post_likes WHERE post = $1 AND author = $2")
        .bind(id.0)
        .bind(author.as_uuid())
        .execute(pool)
        .await?;

    Ok(())
}
