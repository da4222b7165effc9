//! Review endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use chrono::{DateTime, Utc};
use common::{ItemId, UserId};
use domain::NewReview;
use serde::{Deserialize, Serialize};
use store::{Review, Store};

use crate::AppState;
use crate::error::ApiError;

use super::{parse_uuid, require_principal};

#[derive(Deserialize)]
pub struct CreateReviewRequest {
    pub item_id: String,
    pub rating: u8,
    pub comment: Option<String>,
}

#[derive(Serialize)]
pub struct ReviewResponse {
    pub id: String,
    pub user_id: String,
    pub item_id: String,
    pub rating: u8,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&Review> for ReviewResponse {
    fn from(review: &Review) -> Self {
        Self {
            id: review.id.to_string(),
            user_id: review.user_id.to_string(),
            item_id: review.item_id.to_string(),
            rating: review.rating,
            comment: review.comment.clone(),
            created_at: review.created_at,
        }
    }
}

/// Review plus the submitter's display name, for the public feed.
#[derive(Serialize)]
pub struct ReviewFeedResponse {
    #[serde(flatten)]
    pub review: ReviewResponse,
    pub user_name: String,
}

// -- Handlers --

/// POST /reviews — submit a review for an item.
#[tracing::instrument(skip(state, headers, req))]
pub async fn create<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Json(req): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<ReviewResponse>), ApiError> {
    let principal = require_principal(&state, &headers).await?;
    let item_id = ItemId::from_uuid(parse_uuid(&req.item_id)?);
    let review = state
        .reviews
        .create(
            &principal,
            NewReview {
                item_id,
                rating: req.rating,
                comment: req.comment,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(ReviewResponse::from(&review))))
}

/// GET /reviews/all — every review with its author's name, newest first.
#[tracing::instrument(skip(state))]
pub async fn all<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<ReviewFeedResponse>>, ApiError> {
    let feed = state.reviews.all().await?;
    Ok(Json(
        feed.iter()
            .map(|entry| ReviewFeedResponse {
                review: ReviewResponse::from(&entry.review),
                user_name: entry.user_name.clone(),
            })
            .collect(),
    ))
}

/// GET /reviews/item/:id — reviews for one item.
#[tracing::instrument(skip(state))]
pub async fn for_item<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ReviewResponse>>, ApiError> {
    let item_id = ItemId::from_uuid(parse_uuid(&id)?);
    let reviews = state.reviews.for_item(item_id).await?;
    Ok(Json(reviews.iter().map(ReviewResponse::from).collect()))
}

/// GET /reviews/user/:id — reviews written by a user. Owner or admin.
#[tracing::instrument(skip(state, headers))]
pub async fn for_user<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Vec<ReviewResponse>>, ApiError> {
    let principal = require_principal(&state, &headers).await?;
    let user_id = UserId::from_uuid(parse_uuid(&id)?);
    let reviews = state.reviews.for_user(&principal, user_id).await?;
    Ok(Json(reviews.iter().map(ReviewResponse::from).collect()))
}
