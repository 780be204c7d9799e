//! Feed records as served to clients and as handed to the store for insertion.

use chrono::{DateTime, Utc};
use murmur_core::{CommentId, IdentityId, PostId};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A post as seen by a particular viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[schema(value_type = i32)]
    pub id: PostId,
    #[schema(value_type = String, format = Uuid)]
    pub author: IdentityId,
    pub created_at: DateTime<Utc>,
    pub content: String,
    pub likes_count: i64,
    pub comments_count: i64,
    /// Whether the viewer has liked this post.
    pub is_liked: bool,
}

/// A comment as seen by a particular viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[schema(value_type = i32)]
    pub id: CommentId,
    #[schema(value_type = i32)]
    pub post: PostId,
    #[schema(value_type = String, format = Uuid)]
    pub author: IdentityId,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub likes_count: i64,
    pub is_liked: bool,
    /// The comment this one replies to, if it still exists.
    #[schema(value_type = Option<i32>)]
    pub reply_comment_id: Option<CommentId>,
    #[schema(value_type = Option<String>, format = Uuid)]
    pub reply_comment_author: Option<IdentityId>,
}

/// Insert request for a post.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub author: IdentityId,
    pub content: String,
}

/// Insert request for a comment.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub post: PostId,
    pub author: IdentityId,
    pub content: String,
    /// Must name a comment under the same post.
    pub reply: Option<CommentId>,
}
