//! Store error types.

use common::{ItemId, OrderId, OrderStatus, UserId};
use thiserror::Error;

/// Errors that can occur when interacting with the datastore.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A user with this email already exists.
    #[error("email already registered: {0}")]
    EmailTaken(String),

    /// The conditional stock decrement affected no record.
    #[error("insufficient stock for item {item_id}: requested {requested}")]
    InsufficientStock { item_id: ItemId, requested: u32 },

    /// The conditional status update lost a race: the order's status was no
    /// longer the expected one when the write executed.
    #[error("order {order_id} status changed concurrently: expected {expected}, found {actual}")]
    StatusConflict {
        order_id: OrderId,
        expected: OrderStatus,
        actual: OrderStatus,
    },

    /// The user has already reviewed this item.
    #[error("user {user_id} has already reviewed item {item_id}")]
    DuplicateReview { user_id: UserId, item_id: ItemId },

    /// A stored value could not be decoded into its domain type.
    #[error("invalid value in column {column}: {value}")]
    InvalidColumn { column: &'static str, value: String },

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
