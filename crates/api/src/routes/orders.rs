//! Order endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use chrono::{DateTime, Utc};
use common::{ItemId, OrderId, OrderStatus, ServiceType, UserId};
use domain::{NewOrder, OrderDetails};
use serde::{Deserialize, Serialize};
use store::{Order, Store};

use crate::AppState;
use crate::error::ApiError;

use super::auth::UserResponse;
use super::items::ItemResponse;
use super::{parse_uuid, require_principal};

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub item_id: String,
    pub service_type: ServiceType,
    pub quantity: u32,
    pub delivery_address: Option<String>,
    pub scheduled_time: Option<DateTime<Utc>>,
    pub mobile_number: Option<String>,
}

#[derive(Deserialize)]
pub struct StatusQuery {
    pub status: OrderStatus,
    pub cancellation_reason: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub user_id: String,
    pub item_id: String,
    pub service_type: String,
    pub status: String,
    pub quantity: u32,
    pub total_price_cents: i64,
    pub delivery_address: Option<String>,
    pub scheduled_time: Option<DateTime<Utc>>,
    pub mobile_number: String,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.to_string(),
            user_id: order.user_id.to_string(),
            item_id: order.item_id.to_string(),
            service_type: order.service_type.as_str().to_string(),
            status: order.status.as_str().to_string(),
            quantity: order.quantity,
            total_price_cents: order.total_price.cents(),
            delivery_address: order.delivery_address.clone(),
            scheduled_time: order.scheduled_time,
            mobile_number: order.mobile_number.clone(),
            cancellation_reason: order.cancellation_reason.clone(),
            created_at: order.created_at,
        }
    }
}

/// Order with item and user embedded as of read time. The total still
/// carries the creation-time price snapshot.
#[derive(Serialize)]
pub struct OrderDetailsResponse {
    #[serde(flatten)]
    pub order: OrderResponse,
    pub item: ItemResponse,
    pub user: UserResponse,
}

impl From<&OrderDetails> for OrderDetailsResponse {
    fn from(details: &OrderDetails) -> Self {
        Self {
            order: OrderResponse::from(&details.order),
            item: ItemResponse::from(&details.item),
            user: UserResponse::from(&details.user),
        }
    }
}

// -- Handlers --

/// POST /orders — place an order against current stock.
#[tracing::instrument(skip(state, headers, req))]
pub async fn create<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let principal = require_principal(&state, &headers).await?;
    let item_id = ItemId::from_uuid(parse_uuid(&req.item_id)?);
    let order = state
        .orders
        .create(
            &principal,
            NewOrder {
                item_id,
                service_type: req.service_type,
                quantity: req.quantity,
                delivery_address: req.delivery_address,
                scheduled_time: req.scheduled_time,
                mobile_number: req.mobile_number,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(OrderResponse::from(&order))))
}

/// GET /orders/all — every order with detail. Admin only.
#[tracing::instrument(skip(state, headers))]
pub async fn all<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
) -> Result<Json<Vec<OrderDetailsResponse>>, ApiError> {
    let principal = require_principal(&state, &headers).await?;
    let orders = state.orders.all(&principal).await?;
    Ok(Json(orders.iter().map(OrderDetailsResponse::from).collect()))
}

/// GET /orders/user/:id — a user's orders with detail. Owner or admin.
#[tracing::instrument(skip(state, headers))]
pub async fn for_user<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Vec<OrderDetailsResponse>>, ApiError> {
    let principal = require_principal(&state, &headers).await?;
    let user_id = UserId::from_uuid(parse_uuid(&id)?);
    let orders = state.orders.for_user(&principal, user_id).await?;
    Ok(Json(orders.iter().map(OrderDetailsResponse::from).collect()))
}

/// GET /orders/:id — one order with detail. Owner or admin.
#[tracing::instrument(skip(state, headers))]
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<OrderDetailsResponse>, ApiError> {
    let principal = require_principal(&state, &headers).await?;
    let order_id = OrderId::from_uuid(parse_uuid(&id)?);
    let details = state.orders.get(&principal, order_id).await?;
    Ok(Json(OrderDetailsResponse::from(&details)))
}

/// PATCH /orders/:id/status — move an order through its lifecycle. Admin
/// only; cancellation requires a reason.
#[tracing::instrument(skip(state, headers, query))]
pub async fn update_status<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<OrderResponse>, ApiError> {
    let principal = require_principal(&state, &headers).await?;
    let order_id = OrderId::from_uuid(parse_uuid(&id)?);
    let order = state
        .orders
        .update_status(
            &principal,
            order_id,
            query.status,
            query.cancellation_reason,
        )
        .await?;
    Ok(Json(OrderResponse::from(&order)))
}
