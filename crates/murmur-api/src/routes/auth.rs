//! # Credential Issuance API
//!
//! `POST /auth` resolves the caller's network origin, upserts the identity
//! registered to it, and returns a fresh signed credential.

use axum::extract::{Request, State};
use axum::routing::post;
use axum::{Json, Router};
use murmur_core::IdentityId;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::state::AppState;

/// Response to a successful issuance.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    /// Compact ES256 credential, valid for 48 hours.
    pub token: String,
    /// Identity the credential names.
    #[schema(value_type = String, format = Uuid)]
    pub uuid: IdentityId,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/auth", post(issue))
}

#[utoipa::path(
    post,
    path = "/auth",
    responses(
        (status = 200, description = "Credential issued", body = AuthResponse),
        (status = 500, description = "Origin unresolvable or signing failed", body = crate::error::ErrorBody),
    ),
    security(()),
    tag = "auth"
)]
async fn issue(State(state): State<AppState>, request: Request) -> Result<Json<AuthResponse>, AppError> {
    let origin = state.resolver.resolve(&request)?;
    let issued = state.issuer.issue(origin).await?;

    Ok(Json(AuthResponse {
        token: issued.token,
        uuid: issued.identity,
    }))
}
