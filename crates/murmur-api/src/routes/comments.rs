//! # Comments API
//!
//! Comments hang off a post and may reply to another comment under the
//! same post. A reply that names a comment elsewhere (or nowhere) is a 404.

use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use murmur_core::{CommentId, Page, PostId, ValidationError, COMMENTS_PAGE_SIZE};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::context::{Caller, RequestContext};
use crate::error::AppError;
use crate::extractors::{extract_query, extract_validated_json, require_content, ListQuery, Validate};
use crate::model::{Comment, NewComment};
use crate::state::AppState;

/// Request to create a comment.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCommentRequest {
    #[serde(default)]
    pub content: String,
    /// Comment being replied to. `0` or absent means none.
    #[serde(default, alias = "Reply")]
    pub reply: Option<i32>,
}

impl CreateCommentRequest {
    fn reply_target(&self) -> Option<CommentId> {
        self.reply.filter(|id| *id != 0).map(CommentId)
    }
}

impl Validate for CreateCommentRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        require_content(&self.content)
    }
}

/// One page of comments.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentsPage {
    pub next_offset: Option<i64>,
    pub comments: Vec<Comment>,
}

impl From<Page<Comment>> for CommentsPage {
    fn from(page: Page<Comment>) -> Self {
        Self {
            next_offset: page.next_offset,
            comments: page.items,
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/posts/:postId/comments",
            get(list_comments).post(create_comment),
        )
        .route(
            "/comments/:commentId",
            get(get_comment).delete(delete_comment),
        )
        .route(
            "/comments/:commentId/like",
            post(like_comment).delete(unlike_comment),
        )
}

#[utoipa::path(
    get,
    path = "/posts/{postId}/comments",
    params(("postId" = i32, Path, description = "Post ID"), ListQuery),
    responses(
        (status = 200, description = "One page of comments", body = CommentsPage),
        (status = 400, description = "Invalid post id or offset", body = crate::error::ErrorBody),
    ),
    tag = "comments"
)]
async fn list_comments(
    State(state): State<AppState>,
    Caller(viewer): Caller,
    Path(raw): Path<String>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<CommentsPage>, AppError> {
    let post = PostId::parse_param(&raw, "postId")?;
    let plan = extract_query(query)?.plan(COMMENTS_PAGE_SIZE)?;
    let comments = state.store.list_comments(post, viewer, &plan).await?;
    Ok(Json(Page::from_rows(&plan, comments).into()))
}

#[utoipa::path(
    post,
    path = "/posts/{postId}/comments",
    params(("postId" = i32, Path, description = "Post ID")),
    request_body = CreateCommentRequest,
    responses(
        (status = 200, description = "Comment created", body = Comment),
        (status = 400, description = "Empty content or invalid body", body = crate::error::ErrorBody),
        (status = 404, description = "No such post or reply target", body = crate::error::ErrorBody),
    ),
    tag = "comments"
)]
async fn create_comment(
    State(state): State<AppState>,
    Caller(author): Caller,
    Path(raw): Path<String>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<Comment>, AppError> {
    let post = PostId::parse_param(&raw, "postId")?;
    let req: CreateCommentRequest = extract_validated_json(body)?;
    let reply = req.reply_target();

    let comment = state
        .store
        .create_comment(NewComment {
            post,
            author,
            content: req.content,
            reply,
        })
        .await?;

    tracing::info!(comment = %comment.id, post = %post, author = %author, "comment created");
    Ok(Json(comment))
}

#[utoipa::path(
    get,
    path = "/comments/{commentId}",
    params(("commentId" = i32, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Comment found", body = Comment),
        (status = 404, description = "No such comment", body = crate::error::ErrorBody),
    ),
    tag = "comments"
)]
async fn get_comment(
    State(state): State<AppState>,
    Caller(viewer): Caller,
    Path(raw): Path<String>,
) -> Result<Json<Comment>, AppError> {
    let id = CommentId::parse_param(&raw, "commentId")?;
    Ok(Json(state.store.get_comment(id, viewer).await?))
}

#[utoipa::path(
    delete,
    path = "/comments/{commentId}",
    params(("commentId" = i32, Path, description = "Comment ID")),
    responses(
        (status = 204, description = "Comment deleted"),
        (status = 403, description = "Caller is not the author", body = crate::error::ErrorBody),
        (status = 404, description = "No such comment", body = crate::error::ErrorBody),
    ),
    tag = "comments"
)]
async fn delete_comment(
    State(state): State<AppState>,
    Caller(caller): Caller,
    ctx: RequestContext,
    Path(raw): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = CommentId::parse_param(&raw, "commentId")?;

    let author = state.store.comment_author(id).await?;
    if author != caller {
        return Err(AppError::Forbidden(format!(
            "comment {id} belongs to {author}, not {caller}"
        )));
    }

    ctx.ensure_active()?;
    state.store.delete_comment(id).await?;

    tracing::info!(comment = %id, author = %caller, "comment deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/comments/{commentId}/like",
    params(("commentId" = i32, Path, description = "Comment ID")),
    responses(
        (status = 204, description = "Comment liked"),
        (status = 404, description = "No such comment", body = crate::error::ErrorBody),
    ),
    tag = "comments"
)]
async fn like_comment(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(raw): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = CommentId::parse_param(&raw, "commentId")?;
    state.store.like_comment(id, caller).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/comments/{commentId}/like",
    params(("commentId" = i32, Path, description = "Comment ID")),
    responses((status = 204, description = "Like removed")),
    tag = "comments"
)]
async fn unlike_comment(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(raw): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = CommentId::parse_param(&raw, "commentId")?;
    state.store.unlike_comment(id, caller).await?;
    Ok(StatusCode::NO_CONTENT)
}
