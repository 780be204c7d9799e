//! In-memory [`FeedStore`].
//!
//! All tables sit behind one `parking_lot::RwLock`. Every operation takes
//! the lock once, so each call is atomic with respect to the others:
//! identity upserts cannot race into duplicates and a post deletion never
//! leaves orphaned comments visible.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use murmur_core::{CommentId, Identity, IdentityId, NetworkOrigin, PaginationPlan, PostId, SortMode};
use parking_lot::RwLock;

use super::{FeedStore, StoreError};
use crate::model::{Comment, NewComment, NewPost, Post};

#[derive(Debug, Clone)]
struct PostRow {
    id: PostId,
    author: IdentityId,
    content: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct CommentRow {
    id: CommentId,
    post: PostId,
    author: IdentityId,
    content: String,
    created_at: DateTime<Utc>,
    reply: Option<CommentId>,
}

#[derive(Debug, Default)]
struct Tables {
    identities: HashMap<NetworkOrigin, Identity>,
    posts: BTreeMap<PostId, PostRow>,
    comments: BTreeMap<CommentId, CommentRow>,
    post_likes: HashSet<(PostId, IdentityId)>,
    comment_likes: HashSet<(CommentId, IdentityId)>,
    last_post_id: i32,
    last_comment_id: i32,
}

impl Tables {
    fn post_likes(&self, id: PostId) -> i64 {
        self.post_likes.iter().filter(|(p, _)| *p == id).count() as i64
    }

    fn comment_likes(&self, id: CommentId) -> i64 {
        self.comment_likes.iter().filter(|(c, _)| *c == id).count() as i64
    }

    fn post_view(&self, row: &PostRow, viewer: IdentityId) -> Post {
        Post {
            id: row.id,
            author: row.author,
            created_at: row.created_at,
            content: row.content.clone(),
            likes_count: self.post_likes(row.id),
            comments_count: self.comments.values().filter(|c| c.post == row.id).count() as i64,
            is_liked: self.post_likes.contains(&(row.id, viewer)),
        }
    }

    fn comment_view(&self, row: &CommentRow, viewer: IdentityId) -> Comment {
        let reply = row.reply.and_then(|id| self.comments.get(&id));
        Comment {
            id: row.id,
            post: row.post,
            author: row.author,
            content: row.content.clone(),
            created_at: row.created_at,
            likes_count: self.comment_likes(row.id),
            is_liked: self.comment_likes.contains(&(row.id, viewer)),
            reply_comment_id: reply.map(|r| r.id),
            reply_comment_author: reply.map(|r| r.author),
        }
    }
}

/// Process-local feed storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches_search(content: &str, plan: &PaginationPlan) -> bool {
    match plan.search() {
        Some(term) => content.to_lowercase().contains(&term.to_lowercase()),
        None => true,
    }
}

/// Sort, then apply offset and limit.
fn paginate<T>(
    mut rows: Vec<T>,
    plan: &PaginationPlan,
    key: impl Fn(&T) -> (i64, DateTime<Utc>, i32),
) -> Vec<T> {
    rows.sort_by(|a, b| {
        let (a_likes, a_at, a_id) = key(a);
        let (b_likes, b_at, b_id) = key(b);
        match plan.sort() {
            SortMode::OldestFirst => (a_at, a_id).cmp(&(b_at, b_id)),
            SortMode::NewestFirst => (b_at, b_id).cmp(&(a_at, a_id)),
            SortMode::TopFirst => (b_likes, b_at, b_id).cmp(&(a_likes, a_at, a_id)),
        }
    });

    let offset = usize::try_from(plan.offset()).unwrap_or(usize::MAX);
    let limit = usize::try_from(plan.limit()).unwrap_or(usize::MAX);
    rows.into_iter().skip(offset).take(limit).collect()
}

#[async_trait]
impl FeedStore for MemoryStore {
    async fn upsert_identity(&self, origin: NetworkOrigin) -> Result<Identity, StoreError> {
        let mut tables = self.tables.write();
        let identity = tables
            .identities
            .entry(origin)
            .or_insert_with(|| Identity::new(origin));
        Ok(identity.clone())
    }

    async fn list_posts(
        &self,
        viewer: IdentityId,
        plan: &PaginationPlan,
    ) -> Result<Vec<Post>, StoreError> {
        let tables = self.tables.read();
        let rows = tables
            .posts
            .values()
            .filter(|p| matches_search(&p.content, plan))
            .map(|p| tables.post_view(p, viewer))
            .collect();
        Ok(paginate(rows, plan, |p: &Post| {
            (p.likes_count, p.created_at, p.id.0)
        }))
    }

    async fn create_post(&self, post: NewPost) -> Result<Post, StoreError> {
        let mut tables = self.tables.write();
        tables.last_post_id += 1;
        let row = PostRow {
            id: PostId(tables.last_post_id),
            author: post.author,
            content: post.content,
            created_at: Utc::now(),
        };
        let view = tables.post_view(&row, post.author);
        tables.posts.insert(row.id, row);
        Ok(view)
    }

    async fn post_author(&self, id: PostId) -> Result<IdentityId, StoreError> {
        self.tables
            .read()
            .posts
            .get(&id)
            .map(|p| p.author)
            .ok_or_else(|| StoreError::NotFound(format!("post {id}")))
    }

    async fn delete_post(&self, id: PostId) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        if tables.posts.remove(&id).is_none() {
            return Err(StoreError::NotFound(format!("post {id}")));
        }
        let removed: HashSet<CommentId> = tables
            .comments
            .values()
            .filter(|c| c.post == id)
            .map(|c| c.id)
            .collect();
        tables.comments.retain(|cid, _| !removed.contains(cid));
        tables.comment_likes.retain(|(cid, _)| !removed.contains(cid));
        tables.post_likes.retain(|(pid, _)| *pid != id);
        Ok(())
    }

    async fn like_post(&self, id: PostId, author: IdentityId) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        if !tables.posts.contains_key(&id) {
            return Err(StoreError::NotFound(format!("post {id}")));
        }
        tables.post_likes.insert((id, author));
        Ok(())
    }

    async fn unlike_post(&self, id: PostId, author: IdentityId) -> Result<(), StoreError> {
        self.tables.write().post_likes.remove(&(id, author));
        Ok(())
    }

    async fn list_comments(
        &self,
        post: PostId,
        viewer: IdentityId,
        plan: &PaginationPlan,
    ) -> Result<Vec<Comment>, StoreError> {
        let tables = self.tables.read();
        let rows = tables
            .comments
            .values()
            .filter(|c| c.post == post && matches_search(&c.content, plan))
            .map(|c| tables.comment_view(c, viewer))
            .collect();
        Ok(paginate(rows, plan, |c: &Comment| {
            (c.likes_count, c.created_at, c.id.0)
        }))
    }

    async fn get_comment(&self, id: CommentId, viewer: IdentityId) -> Result<Comment, StoreError> {
        let tables = self.tables.read();
        tables
            .comments
            .get(&id)
            .map(|c| tables.comment_view(c, viewer))
            .ok_or_else(|| StoreError::NotFound(format!("comment {id}")))
    }

    async fn create_comment(&self, comment: NewComment) -> Result<Comment, StoreError> {
        let mut tables = self.tables.write();
        if !tables.posts.contains_key(&comment.post) {
            return Err(StoreError::NotFound(format!("post {}", comment.post)));
        }
        if let Some(reply) = comment.reply {
            match tables.comments.get(&reply) {
                Some(target) if target.post == comment.post => {}
                _ => return Err(StoreError::NotFound(format!("comment {reply}"))),
            }
        }

        tables.last_comment_id += 1;
        let row = CommentRow {
            id: CommentId(tables.last_comment_id),
            post: comment.post,
            author: comment.author,
            content: comment.content,
            created_at: Utc::now(),
            reply: comment.reply,
        };
        let view = tables.comment_view(&row, comment.author);
        tables.comments.insert(row.id, row);
        Ok(view)
    }

    async fn comment_author(&self, id: CommentId) -> Result<IdentityId, StoreError> {
        self.tables
            .read()
            .comments
            .get(&id)
            .map(|c| c.author)
            .ok_or_else(|| StoreError::NotFound(format!("comment {id}")))
    }

    async fn delete_comment(&self, id: CommentId) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        if tables.comments.remove(&id).is_none() {
            return Err(StoreError::NotFound(format!("comment {id}")));
        }
        tables.comment_likes.retain(|(cid, _)| *cid != id);
        for row in tables.comments.values_mut() {
            if row.reply == Some(id) {
                row.reply = None;
            }
        }
        Ok(())
    }

    async fn like_comment(&self, id: CommentId, author: IdentityId) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        if !tables.comments.contains_key(&id) {
            return Err(StoreError::NotFound(format!("comment {id}")));
        }
        tables.comment_likes.insert((id, author));
        Ok(())
    }

    async fn unlike_comment(&self, id: CommentId, author: IdentityId) -> Result<(), StoreError> {
        self.tables.write().comment_likes.remove(&(id, author));
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
