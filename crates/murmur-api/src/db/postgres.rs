//! PostgreSQL-backed [`FeedStore`].

use async_trait::async_trait;
use murmur_core::{CommentId, Identity, IdentityId, NetworkOrigin, PaginationPlan, PostId};
use sqlx::PgPool;

use super::{comments, identities, posts, FeedStore, StoreError};
use crate::model::{Comment, NewComment, NewPost, Post};

/// Feed storage over a shared connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Translate a foreign key violation into `NotFound(what)`.
fn missing_parent(err: sqlx::Error, what: String) -> StoreError {
    match err.as_database_error() {
        Some(db) if db.is_foreign_key_violation() => StoreError::NotFound(what),
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl FeedStore for PgStore {
    async fn upsert_identity(&self, origin: NetworkOrigin) -> Result<Identity, StoreError> {
        let candidate = Identity::new(origin);
        let row = identities::upsert(&self.pool, *candidate.id.as_uuid(), &origin.to_string())
            .await?;
        let stored: NetworkOrigin = row
            .origin
            .parse()
            .map_err(|e| StoreError::Corrupt(format!("identity {}: {e}", row.id)))?;

        Ok(Identity {
            id: IdentityId::from_uuid(row.id),
            origin: stored,
            created_at: row.created_at,
        })
    }

    async fn list_posts(
        &self,
        viewer: IdentityId,
        plan: &PaginationPlan,
    ) -> Result<Vec<Post>, StoreError> {
        Ok(posts::list(&self.pool, viewer, plan).await?)
    }

    async fn create_post(&self, post: NewPost) -> Result<Post, StoreError> {
        Ok(posts::insert(&self.pool, post.author, &post.content).await?)
    }

    async fn post_author(&self, id: PostId) -> Result<IdentityId, StoreError> {
        posts::author(&self.pool, id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("post {id}")))
    }

    async fn delete_post(&self, id: PostId) -> Result<(), StoreError> {
        if posts::delete(&self.pool, id).await? {
            Ok(())
        } else {
            Err(StoreError::NotFound(format!("post {id}")))
        }
    }

    async fn like_post(&self, id: PostId, author: IdentityId) -> Result<(), StoreError> {
        posts::like(&self.pool, id, author)
            .await
            .map_err(|e| missing_parent(e, format!("post {id}")))
    }

    async fn unlike_post(&self, id: PostId, author: IdentityId) -> Result<(), StoreError> {
        Ok(posts::unlike(&self.pool, id, author).await?)
    }

    async fn list_comments(
        &self,
        post: PostId,
        viewer: IdentityId,
        plan: &PaginationPlan,
    ) -> Result<Vec<Comment>, StoreError> {
        Ok(comments::list(&self.pool, post, viewer, plan).await?)
    }

    async fn get_comment(&self, id: CommentId, viewer: IdentityId) -> Result<Comment, StoreError> {
        comments::get_by_id(&self.pool, id, viewer)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("comment {id}")))
    }

    async fn create_comment(&self, comment: NewComment) -> Result<Comment, StoreError> {
        if let Some(reply) = comment.reply {
            match comments::post_of(&self.pool, reply).await? {
                Some(post) if post == comment.post => {}
                _ => return Err(StoreError::NotFound(format!("comment {reply}"))),
            }
        }

        let id = comments::insert(
            &self.pool,
            comment.post,
            comment.author,
            &comment.content,
            comment.reply,
        )
        .await
        .map_err(|e| missing_parent(e, format!("post {}", comment.post)))?;

        self.get_comment(id, comment.author).await
    }

    async fn comment_author(&self, id: CommentId) -> Result<IdentityId, StoreError> {
        comments::author(&self.pool, id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("comment {id}")))
    }

    async fn delete_comment(&self, id: CommentId) -> Result<(), StoreError> {
        if comments::delete(&self.pool, id).await? {
            Ok(())
        } else {
            Err(StoreError::NotFound(format!("comment {id}")))
        }
    }

    async fn like_comment(&self, id: CommentId, author: IdentityId) -> Result<(), StoreError> {
        comments::like(&self.pool, id, author)
            .await
            .map_err(|e| missing_parent(e, format!("comment {id}")))
    }

    async fn unlike_comment(&self, id: CommentId, author: IdentityId) -> Result<(), StoreError> {
        Ok(comments::unlike(&self.pool, id, author).await?)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
