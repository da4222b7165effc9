//! Catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use chrono::{DateTime, Utc};
use common::ItemId;
use serde::{Deserialize, Serialize};
use store::{Item, Store};

use crate::AppState;
use crate::error::ApiError;

use super::parse_uuid;
use super::reviews::ReviewResponse;

#[derive(Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
}

#[derive(Serialize)]
pub struct ItemResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price_cents: i64,
    pub category: String,
    pub stock_quantity: u32,
    pub created_at: DateTime<Utc>,
}

impl From<&Item> for ItemResponse {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id.to_string(),
            name: item.name.clone(),
            description: item.description.clone(),
            image_url: item.image_url.clone(),
            price_cents: item.price.cents(),
            category: item.category.clone(),
            stock_quantity: item.stock_quantity,
            created_at: item.created_at,
        }
    }
}

/// Item plus its reviews and derived rating aggregates.
#[derive(Serialize)]
pub struct ItemDetailsResponse {
    #[serde(flatten)]
    pub item: ItemResponse,
    pub reviews: Vec<ReviewResponse>,
    pub average_rating: Option<f64>,
    pub review_count: u32,
}

// -- Handlers --

/// GET /items — list items, optionally filtered by exact category.
#[tracing::instrument(skip(state, query))]
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ItemResponse>>, ApiError> {
    // An empty `?category=` means no filter.
    let category = query.category.as_deref().filter(|c| !c.is_empty());
    let items = state.catalog.items(category).await?;
    Ok(Json(items.iter().map(ItemResponse::from).collect()))
}

/// GET /items/:id — item with reviews and rating aggregates.
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<ItemDetailsResponse>, ApiError> {
    let item_id = ItemId::from_uuid(parse_uuid(&id)?);
    let details = state.catalog.item(item_id).await?;
    Ok(Json(ItemDetailsResponse {
        item: ItemResponse::from(&details.item),
        reviews: details.reviews.iter().map(ReviewResponse::from).collect(),
        average_rating: details.average_rating,
        review_count: details.review_count,
    }))
}

/// GET /items/categories/list — distinct categories in the catalog.
#[tracing::instrument(skip(state))]
pub async fn categories<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.catalog.categories().await?))
}
