//! # murmur-api: Axum Service for the murmur Feed
//!
//! Anonymous callers obtain an origin-bound credential from `POST /auth`
//! and use it to read and write a shared feed of posts and comments.
//!
//! ## API Surface
//!
//! | Route                            | Module                | Auth |
//! |----------------------------------|-----------------------|------|
//! | `POST /auth`                     | [`routes::auth`]      | no   |
//! | `GET/POST /posts`                | [`routes::posts`]     | yes  |
//! | `DELETE /posts/:postId`          | [`routes::posts`]     | yes  |
//! | `POST/DELETE /posts/:postId/like`| [`routes::posts`]     | yes  |
//! | `GET/POST /posts/:postId/comments` | [`routes::comments`] | yes |
//! | `GET/DELETE /comments/:commentId`| [`routes::comments`]  | yes  |
//! | `POST/DELETE /comments/:commentId/like` | [`routes::comments`] | yes |
//! | `GET /health/liveness`, `GET /health/readiness` | this module | no |
//! | `GET /openapi.json`              | [`openapi`]           | no   |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → RequestPipeline → [AuthMiddleware on feed routes] → Handler
//! ```

pub mod auth;
pub mod context;
pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod model;
pub mod openapi;
pub mod origin;
pub mod routes;
pub mod state;

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::from_fn_with_state;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;

use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
///
/// Every route, the fallback included, runs inside the request pipeline.
/// Only the feed routes require a credential.
pub fn app(state: AppState) -> Router {
    let feed = Router::new()
        .merge(routes::posts::router())
        .merge(routes::comments::router())
        .route_layer(from_fn_with_state(state.clone(), auth::auth_middleware));

    Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .merge(openapi::router())
        .merge(routes::auth::router())
        .merge(feed)
        .fallback(routes::not_found)
        .layer(from_fn_with_state(
            state.clone(),
            middleware::pipeline::pipeline,
        ))
        .layer(middleware::tracing_layer::layer())
        .with_state(state)
}

/// Liveness probe: always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: 200 "ready" when the store answers, 503 otherwise.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    if let Err(e) = state.store.ping().await {
        tracing::warn!("Store health check failed: {e}");
        return (StatusCode::SERVICE_UNAVAILABLE, "store unreachable").into_response();
    }

    (StatusCode::OK, "ready").into_response()
}
