//! Persistent record types.
//!
//! Plain data carried between the store and the services. Invariants that
//! span records (stock accounting, status transitions) are enforced by the
//! store's atomic operations and the domain services, not here.

use chrono::{DateTime, Utc};
use common::{ItemId, Money, OrderId, OrderStatus, ReviewId, Role, ServiceType, UserId};
use serde::{Deserialize, Serialize};

/// A registered account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    /// Unique across the store.
    pub email: String,
    /// Salted hash; never serialized out through the API layer.
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// An orderable catalog item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    /// Unit price; snapshotted onto orders at creation time.
    pub price: Money,
    pub category: String,
    /// Remaining available stock. Only mutated by the store's atomic
    /// reserve/release operations and catalog-management writes.
    pub stock_quantity: u32,
    pub created_at: DateTime<Utc>,
}

/// A customer order for a single item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub item_id: ItemId,
    pub service_type: ServiceType,
    pub status: OrderStatus,
    pub quantity: u32,
    /// Price snapshot × quantity, frozen at creation. Later edits to the
    /// item's price never change this.
    pub total_price: Money,
    /// Required iff `service_type` is delivery.
    pub delivery_address: Option<String>,
    /// Required iff `service_type` is in-person. Descriptive metadata only;
    /// nothing schedules transitions from it.
    pub scheduled_time: Option<DateTime<Utc>>,
    pub mobile_number: String,
    /// Present iff `status` is cancelled.
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A rating left by a user for an item. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub user_id: UserId,
    pub item_id: ItemId,
    /// Stars in `1..=5`.
    pub rating: u8,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}
