//! # Posts API
//!
//! Listing, creation, deletion, and likes for posts. Only the author may
//! delete a post; deleting it removes its comments and likes.

use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use murmur_core::{Page, PostId, ValidationError, POSTS_PAGE_SIZE};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::context::{Caller, RequestContext};
use crate::error::AppError;
use crate::extractors::{extract_query, extract_validated_json, require_content, ListQuery, Validate};
use crate::model::{NewPost, Post};
use crate::state::AppState;

/// Request to create a post.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePostRequest {
    #[serde(default)]
    pub content: String,
}

impl Validate for CreatePostRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        require_content(&self.content)
    }
}

/// One page of posts.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostsPage {
    /// Offset of the next page, or `null` on the last page.
    pub next_offset: Option<i64>,
    pub posts: Vec<Post>,
}

impl From<Page<Post>> for PostsPage {
    fn from(page: Page<Post>) -> Self {
        Self {
            next_offset: page.next_offset,
            posts: page.items,
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route("/posts/:postId", delete(delete_post))
        .route("/posts/:postId/like", post(like_post).delete(unlike_post))
}

#[utoipa::path(
    get,
    path = "/posts",
    params(ListQuery),
    responses(
        (status = 200, description = "One page of posts", body = PostsPage),
        (status = 400, description = "Invalid offset", body = crate::error::ErrorBody),
        (status = 401, description = "Missing or invalid credential", body = crate::error::ErrorBody),
    ),
    tag = "posts"
)]
async fn list_posts(
    State(state): State<AppState>,
    Caller(viewer): Caller,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<PostsPage>, AppError> {
    let plan = extract_query(query)?.plan(POSTS_PAGE_SIZE)?;
    let posts = state.store.list_posts(viewer, &plan).await?;
    Ok(Json(Page::from_rows(&plan, posts).into()))
}

#[utoipa::path(
    post,
    path = "/posts",
    request_body = CreatePostRequest,
    responses(
        (status = 200, description = "Post created", body = Post),
        (status = 400, description = "Empty content or invalid body", body = crate::error::ErrorBody),
    ),
    tag = "posts"
)]
async fn create_post(
    State(state): State<AppState>,
    Caller(author): Caller,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<Post>, AppError> {
    let req: CreatePostRequest = extract_validated_json(body)?;
    let post = state
        .store
        .create_post(NewPost {
            author,
            content: req.content,
        })
        .await?;

    tracing::info!(post = %post.id, author = %author, "post created");
    Ok(Json(post))
}

#[utoipa::path(
    delete,
    path = "/posts/{postId}",
    params(("postId" = i32, Path, description = "Post ID")),
    responses(
        (status = 204, description = "Post deleted"),
        (status = 403, description = "Caller is not the author", body = crate::error::ErrorBody),
        (status = 404, description = "No such post", body = crate::error::ErrorBody),
    ),
    tag = "posts"
)]
async fn delete_post(
    State(state): State<AppState>,
    Caller(caller): Caller,
    ctx: RequestContext,
    Path(raw): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = PostId::parse_param(&raw, "postId")?;

    let author = state.store.post_author(id).await?;
    if author != caller {
        return Err(AppError::Forbidden(format!(
            "post {id} belongs to {author}, not {caller}"
        )));
    }

    ctx.ensure_active()?;
    state.store.delete_post(id).await?;

    tracing::info!(post = %id, author = %caller, "post deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/posts/{postId}/like",
    params(("postId" = i32, Path, description = "Post ID")),
    responses(
        (status = 204, description = "Post liked"),
        (status = 404, description = "No such post", body = crate::error::ErrorBody),
    ),
    tag = "posts"
)]
async fn like_post(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(raw): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = PostId::parse_param(&raw, "postId")?;
    state.store.like_post(id, caller).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/posts/{postId}/like",
    params(("postId" = i32, Path, description = "Post ID")),
    responses((status = 204, description = "Like removed")),
    tag = "posts"
)]
async fn unlike_post(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(raw): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = PostId::parse_param(&raw, "postId")?;
    state.store.unlike_post(id, caller).await?;
    Ok(StatusCode::NO_CONTENT)
}
