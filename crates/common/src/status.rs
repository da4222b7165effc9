//! Order status state machine and service types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How an order is fulfilled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    /// Goods delivered to an address.
    Delivery,

    /// Service performed in person at a scheduled time.
    InPerson,
}

impl ServiceType {
    /// Returns the service type name as stored and serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Delivery => "delivery",
            ServiceType::InPerson => "in_person",
        }
    }
}

impl std::fmt::Display for ServiceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unknown service type.
#[derive(Debug, Error)]
#[error("unknown service type: {0}")]
pub struct ParseServiceTypeError(pub String);

impl std::str::FromStr for ServiceType {
    type Err = ParseServiceTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "delivery" => Ok(ServiceType::Delivery),
            "in_person" => Ok(ServiceType::InPerson),
            other => Err(ParseServiceTypeError(other.to_string())),
        }
    }
}

/// The status of an order in its lifecycle.
///
/// Status transitions:
/// ```text
/// Pending ──┬──► Confirmed ──► InProgress ──► Completed
///           │
///           └──► Cancelled
/// ```
///
/// `Completed` and `Cancelled` are terminal; no backward transitions exist,
/// and re-asserting the current status is itself an invalid transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Placed by a customer, awaiting an admin decision.
    #[default]
    Pending,

    /// Accepted by an admin.
    Confirmed,

    /// Being fulfilled.
    InProgress,

    /// Fulfilled (terminal).
    Completed,

    /// Cancelled with a reason (terminal). Stock is released.
    Cancelled,
}

impl OrderStatus {
    /// Returns true if the transition to `next` is in the allowed table.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::{Cancelled, Completed, Confirmed, InProgress, Pending};
        matches!(
            (*self, next),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, InProgress)
                | (InProgress, Completed)
        )
    }

    /// Returns true if this is a terminal status (no further transitions).
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Returns the status name as stored and serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::InProgress => "in_progress",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unknown order status.
#[derive(Debug, Error)]
#[error("unknown order status: {0}")]
pub struct ParseOrderStatusError(pub String);

impl std::str::FromStr for OrderStatus {
    type Err = ParseOrderStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "in_progress" => Ok(OrderStatus::InProgress),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(ParseOrderStatusError(other.to_string())),
        }
    }
}
