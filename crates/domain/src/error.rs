//! Domain error taxonomy.

use common::{ItemId, OrderId, OrderStatus, UserId};
use store::StoreError;
use thiserror::Error;

/// Errors surfaced by the domain services.
///
/// Every domain failure carries a stable kind; the API layer maps kinds to
/// HTTP statuses. A lost race on the conditional stock decrement arrives
/// here already converted to [`DomainError::OutOfStock`].
#[derive(Debug, Error)]
pub enum DomainError {
    /// Order quantity must be at least one.
    #[error("invalid quantity: {quantity} (must be at least 1)")]
    InvalidQuantity { quantity: u32 },

    /// Rating outside the 1..=5 range.
    #[error("invalid rating: {rating} (must be between 1 and 5)")]
    InvalidRating { rating: u8 },

    /// A required field is absent or empty.
    #[error("{field} is required")]
    MissingField { field: &'static str },

    /// A review references an item that does not exist.
    #[error("cannot review unknown item {item_id}")]
    UnknownItem { item_id: ItemId },

    /// The user has already reviewed this item.
    #[error("item {item_id} already reviewed by this user")]
    AlreadyReviewed { item_id: ItemId },

    /// The requested item does not exist.
    #[error("item not found: {item_id}")]
    ItemNotFound { item_id: ItemId },

    /// The requested order does not exist.
    #[error("order not found: {order_id}")]
    OrderNotFound { order_id: OrderId },

    /// The requested user does not exist.
    #[error("user not found: {user_id}")]
    UserNotFound { user_id: UserId },

    /// Not enough stock to cover the requested quantity.
    #[error("insufficient stock for item {item_id}: requested {requested}")]
    OutOfStock { item_id: ItemId, requested: u32 },

    /// The transition is not in the allowed table.
    #[error("invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: OrderStatus,
        to: OrderStatus,
    },

    /// The principal lacks the required role or ownership.
    #[error("not authorized")]
    Forbidden,

    /// A record referenced by another record is missing from the store.
    #[error("referenced {entity} {id} is missing")]
    Inconsistent { entity: &'static str, id: String },

    /// An error below the domain layer.
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for DomainError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::InsufficientStock { item_id, requested } => {
                DomainError::OutOfStock { item_id, requested }
            }
            StoreError::DuplicateReview { item_id, .. } => DomainError::AlreadyReviewed { item_id },
            other => DomainError::Store(other),
        }
    }
}
