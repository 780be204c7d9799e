//! # API Route Modules
//!
//! - `auth`: credential issuance (`POST /auth`), unauthenticated.
//! - `posts`: post listing, creation, deletion, and likes.
//! - `comments`: comment listing under a post, creation with optional
//!   reply target, lookup, deletion, and likes.
//!
//! The `posts` and `comments` routers are mounted behind the auth
//! middleware in [`crate::app`].

pub mod auth;
pub mod comments;
pub mod posts;

use axum::http::Uri;

use crate::error::AppError;

/// Fallback for unmatched routes.
pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("no route for {}", uri.path()))
}
