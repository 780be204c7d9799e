//! # Feed Persistence Layer
//!
//! Handlers talk to storage only through the [`FeedStore`] trait, held as
//! `Arc<dyn FeedStore>` in application state. Two implementations exist:
//!
//! - [`memory::MemoryStore`]: process-local tables behind a lock. Used when
//!   no database URL is configured and by the test suite.
//! - [`postgres::PgStore`]: PostgreSQL via SQLx. The SQL lives in the
//!   table modules ([`identities`], [`posts`], [`comments`]) as free
//!   functions taking a `&PgPool`.
//!
//! Both implementations agree on semantics: likes are idempotent, deleting
//! a post removes its comments and likes, a missing target yields
//! [`StoreError::NotFound`], and every ordering ends with the row id as a
//! final tiebreak so pages never overlap.

pub mod comments;
pub mod identities;
pub mod memory;
pub mod posts;
pub mod postgres;

use async_trait::async_trait;
use murmur_core::{CommentId, Identity, IdentityId, NetworkOrigin, PaginationPlan, PostId, SortMode};
use sqlx::postgres::{PgPool, PgPoolOptions};
use thiserror::Error;

use crate::model::{Comment, NewComment, NewPost, Post};

/// Errors from a [`FeedStore`].
#[derive(Error, Debug)]
pub enum StoreError {
    /// The addressed row does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// Database driver failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored value could not be mapped back into a domain type.
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

/// Storage operations behind the feed endpoints.
///
/// `viewer` arguments drive the per-caller `is_liked` flag only; they never
/// filter results.
#[async_trait]
pub trait FeedStore: Send + Sync {
    /// Return the identity registered to `origin`, creating it on first contact.
    ///
    /// Concurrent calls for one origin converge on a single identity.
    async fn upsert_identity(&self, origin: NetworkOrigin) -> Result<Identity, StoreError>;

    async fn list_posts(
        &self,
        viewer: IdentityId,
        plan: &PaginationPlan,
    ) -> Result<Vec<Post>, StoreError>;

    async fn create_post(&self, post: NewPost) -> Result<Post, StoreError>;

    async fn post_author(&self, id: PostId) -> Result<IdentityId, StoreError>;

    /// Delete a post together with its comments and likes.
    async fn delete_post(&self, id: PostId) -> Result<(), StoreError>;

    async fn like_post(&self, id: PostId, author: IdentityId) -> Result<(), StoreError>;

    async fn unlike_post(&self, id: PostId, author: IdentityId) -> Result<(), StoreError>;

    /// Comments under `post`. An unknown post yields an empty list.
    async fn list_comments(
        &self,
        post: PostId,
        viewer: IdentityId,
        plan: &PaginationPlan,
    ) -> Result<Vec<Comment>, StoreError>;

    async fn get_comment(&self, id: CommentId, viewer: IdentityId)
        -> Result<Comment, StoreError>;

    async fn create_comment(&self, comment: NewComment) -> Result<Comment, StoreError>;

    async fn comment_author(&self, id: CommentId) -> Result<IdentityId, StoreError>;

    async fn delete_comment(&self, id: CommentId) -> Result<(), StoreError>;

    async fn like_comment(&self, id: CommentId, author: IdentityId) -> Result<(), StoreError>;

    async fn unlike_comment(&self, id: CommentId, author: IdentityId) -> Result<(), StoreError>;

    /// Readiness check.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Connect to PostgreSQL and run migrations.
///
/// Returns `None` if `url` is `None` (in-memory-only mode).
/// Returns `Err` if the URL is set but the connection or migration fails.
pub async fn init_pool(url: Option<&str>) -> Result<Option<PgPool>, StoreError> {
    let Some(url) = url else {
        tracing::warn!(
            "DATABASE_URL not set, running in-memory only mode. \
             Feed state will not survive restarts."
        );
        return Ok(None);
    };

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(url)
        .await?;

    tracing::info!("Connected to PostgreSQL");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| StoreError::Database(e.into()))?;
    tracing::info!("Database migrations applied");

    Ok(Some(pool))
}

/// `ORDER BY` body for `sort` over the table aliased `alias`.
///
/// Only static fragments are interpolated into SQL.
pub(crate) fn order_by(sort: SortMode, alias: &str) -> String {
    match sort {
        SortMode::OldestFirst => format!("{alias}.created_at ASC, {alias}.id ASC"),
        SortMode::NewestFirst => format!("{alias}.created_at DESC, {alias}.id DESC"),
        SortMode::TopFirst => {
            format!("likes_count DESC, {alias}.created_at DESC, {alias}.id DESC")
        }
    }
}

/// `ILIKE` pattern matching `term` as a literal substring.
pub(crate) fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_by_ends_with_id_tiebreak() {
        for sort in [SortMode::OldestFirst, SortMode::NewestFirst, SortMode::TopFirst] {
            let clause = order_by(sort, "p");
            assert!(clause.ends_with("p.id ASC") || clause.ends_with("p.id DESC"));
        }
    }

    #[test]
    fn top_first_orders_by_likes_then_recency() {
        assert_eq!(
            order_by(SortMode::TopFirst, "c"),
            "likes_count DESC, c.created_at DESC, c.id DESC"
        );
    }

    #[test]
    fn pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(contains_pattern("a\\b"), "%a\\\\b%");
        assert_eq!(contains_pattern("hello"), "%hello%");
    }

    #[test]
    fn not_found_message() {
        assert_eq!(
            StoreError::NotFound("post 3".into()).to_string(),
            "post 3 not found"
        );
    }
}
