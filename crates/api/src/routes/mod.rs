//! Route handlers.

pub mod auth;
pub mod health;
pub mod items;
pub mod metrics;
pub mod orders;
pub mod reviews;

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use common::Principal;
use store::Store;
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiError;

/// Resolves the bearer token in `Authorization` to a principal.
pub(crate) async fn require_principal<S: Store>(
    state: &AppState<S>,
    headers: &HeaderMap,
) -> Result<Principal, ApiError> {
    let token = bearer_token(headers).ok_or(ApiError::Unauthorized)?;
    Ok(state.auth.verify_token(token).await?)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

pub(crate) fn parse_uuid(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))
}
