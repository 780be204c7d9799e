//! # OpenAPI Specification Assembly
//!
//! Assembles the utoipa-documented routes into one OpenAPI document served
//! at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::state::AppState;

/// Registers the `Authorization` header credential scheme.
///
/// The header carries the bare token (a `Bearer ` prefix is tolerated),
/// so it is modelled as an API key rather than HTTP bearer auth.
struct CredentialAddon;

impl Modify for CredentialAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "credential",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    "Authorization",
                    "ES256 credential from POST /auth, valid for 48 hours.",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "murmur feed API",
        description = "Anonymous social feed: origin-bound credentials, posts, comments, and likes.\n\nObtain a credential with `POST /auth` and send it in the `Authorization` header on every other feed route. Health probes and this document are unauthenticated.",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server"),
    ),
    security(
        ("credential" = [])
    ),
    paths(
        crate::routes::auth::issue,
        crate::routes::posts::list_posts,
        crate::routes::posts::create_post,
        crate::routes::posts::delete_post,
        crate::routes::posts::like_post,
        crate::routes::posts::unlike_post,
        crate::routes::comments::list_comments,
        crate::routes::comments::create_comment,
        crate::routes::comments::get_comment,
        crate::routes::comments::delete_comment,
        crate::routes::comments::like_comment,
        crate::routes::comments::unlike_comment,
    ),
    components(schemas(
        crate::routes::auth::AuthResponse,
        crate::routes::posts::CreatePostRequest,
        crate::routes::posts::PostsPage,
        crate::routes::comments::CreateCommentRequest,
        crate::routes::comments::CommentsPage,
        crate::model::Post,
        crate::model::Comment,
        crate::error::ErrorBody,
    )),
    modifiers(&CredentialAddon),
    tags(
        (name = "auth", description = "Credential issuance"),
        (name = "posts", description = "Posts and post likes"),
        (name = "comments", description = "Comments, replies, and comment likes"),
    )
)]
pub struct ApiDoc;

pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(serve_openapi))
}

async fn serve_openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_feed_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/auth",
            "/posts",
            "/posts/{postId}",
            "/posts/{postId}/like",
            "/posts/{postId}/comments",
            "/comments/{commentId}",
            "/comments/{commentId}/like",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn registers_credential_scheme() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("credential"));
        assert!(components.schemas.contains_key("Post"));
        assert!(components.schemas.contains_key("Comment"));
    }
}
