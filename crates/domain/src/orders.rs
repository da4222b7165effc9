//! Order lifecycle manager.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use common::{ItemId, OrderId, OrderStatus, Principal, ServiceType, UserId};
use notify::{Mail, Mailer};
use store::{Item, Order, Store, StoreError, User};

use crate::error::DomainError;
use crate::policy;

/// Input for creating an order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub item_id: ItemId,
    pub service_type: ServiceType,
    pub quantity: u32,
    pub delivery_address: Option<String>,
    pub scheduled_time: Option<DateTime<Utc>>,
    pub mobile_number: Option<String>,
}

/// An order joined with its item and the ordering user, as of read time.
///
/// `order.total_price` always reflects the creation-time snapshot even
/// when `item.price` has since changed.
#[derive(Debug, Clone)]
pub struct OrderDetails {
    pub order: Order,
    pub item: Item,
    pub user: User,
}

/// Service managing the order lifecycle.
///
/// Creation validates against the catalog, freezes the price snapshot, and
/// reserves stock atomically through the store. Status changes are
/// admin-only and follow the allowed-transition table on
/// [`OrderStatus`]; cancellation releases the reserved stock.
#[derive(Clone)]
pub struct OrderService<S> {
    store: S,
    mailer: Arc<dyn Mailer>,
    /// Recipient for new-order notices; none disables them.
    admin_email: Option<String>,
}

impl<S: Store> OrderService<S> {
    /// Creates a new order service.
    pub fn new(store: S, mailer: Arc<dyn Mailer>, admin_email: Option<String>) -> Self {
        Self {
            store,
            mailer,
            admin_email,
        }
    }

    /// Creates an order in the `pending` state.
    ///
    /// Validation follows the contract order: item existence, quantity
    /// bounds, service-specific required fields. The price snapshot is
    /// taken here and never revisited. The stock decrement happens inside
    /// `Store::insert_order` as one conditional atomic unit; a transient
    /// database failure at that boundary is retried exactly once, and a
    /// lost race surfaces as `OutOfStock`.
    #[tracing::instrument(skip(self, new_order), fields(item_id = %new_order.item_id))]
    pub async fn create(
        &self,
        principal: &Principal,
        new_order: NewOrder,
    ) -> Result<Order, DomainError> {
        let start = Instant::now();

        let item = self
            .store
            .item(new_order.item_id)
            .await?
            .ok_or(DomainError::ItemNotFound {
                item_id: new_order.item_id,
            })?;

        if new_order.quantity < 1 {
            return Err(DomainError::InvalidQuantity {
                quantity: new_order.quantity,
            });
        }
        if new_order.quantity > item.stock_quantity {
            metrics::counter!("orders_out_of_stock").increment(1);
            return Err(DomainError::OutOfStock {
                item_id: item.id,
                requested: new_order.quantity,
            });
        }

        let mobile_number = required(new_order.mobile_number.as_deref(), "mobile_number")?;
        match new_order.service_type {
            ServiceType::Delivery => {
                required(new_order.delivery_address.as_deref(), "delivery_address")?;
            }
            ServiceType::InPerson => {
                if new_order.scheduled_time.is_none() {
                    return Err(DomainError::MissingField {
                        field: "scheduled_time",
                    });
                }
            }
        }

        let order = Order {
            id: OrderId::new(),
            user_id: principal.user_id,
            item_id: item.id,
            service_type: new_order.service_type,
            status: OrderStatus::Pending,
            quantity: new_order.quantity,
            total_price: item.price.multiply(new_order.quantity),
            delivery_address: new_order.delivery_address,
            scheduled_time: new_order.scheduled_time,
            mobile_number,
            cancellation_reason: None,
            created_at: Utc::now(),
        };

        let inserted = match self.store.insert_order(order.clone()).await {
            Err(StoreError::Database(err)) => {
                tracing::warn!(
                    error = %err,
                    "transient store failure during stock reservation, retrying once"
                );
                self.store.insert_order(order).await
            }
            other => other,
        };
        let order = inserted.map_err(|e| {
            if matches!(e, StoreError::InsufficientStock { .. }) {
                metrics::counter!("orders_out_of_stock").increment(1);
            }
            DomainError::from(e)
        })?;

        metrics::counter!("orders_created").increment(1);
        metrics::histogram!("order_create_duration_seconds").record(start.elapsed().as_secs_f64());
        tracing::info!(order_id = %order.id, total_cents = order.total_price.cents(), "order created");

        self.notify_admin(&order).await;
        Ok(order)
    }

    /// Moves an order to a new status. Admin only.
    ///
    /// Cancellation requires a non-empty reason and releases the reserved
    /// stock together with the status write; no other transition has a
    /// stock side effect. A concurrent status change maps back to
    /// `InvalidTransition` against the status actually observed.
    #[tracing::instrument(skip(self, cancellation_reason))]
    pub async fn update_status(
        &self,
        principal: &Principal,
        order_id: OrderId,
        new_status: OrderStatus,
        cancellation_reason: Option<String>,
    ) -> Result<Order, DomainError> {
        policy::require_admin(principal)?;

        let order = self
            .store
            .order(order_id)
            .await?
            .ok_or(DomainError::OrderNotFound { order_id })?;

        if !order.status.can_transition_to(new_status) {
            return Err(DomainError::InvalidTransition {
                from: order.status,
                to: new_status,
            });
        }

        let reason = if new_status == OrderStatus::Cancelled {
            match cancellation_reason.as_deref().map(str::trim) {
                Some(r) if !r.is_empty() => Some(r.to_string()),
                _ => {
                    return Err(DomainError::MissingField {
                        field: "cancellation_reason",
                    });
                }
            }
        } else {
            None
        };

        let updated = self
            .store
            .transition_order(order_id, order.status, new_status, reason.as_deref())
            .await
            .map_err(|e| match e {
                StoreError::StatusConflict { actual, .. } => DomainError::InvalidTransition {
                    from: actual,
                    to: new_status,
                },
                other => DomainError::from(other),
            })?;

        metrics::counter!("order_status_changes").increment(1);
        tracing::info!(order_id = %updated.id, status = %updated.status, "order status updated");

        self.notify_customer(&updated).await;
        Ok(updated)
    }

    /// Loads one order with its item and user. Owner or admin.
    #[tracing::instrument(skip(self))]
    pub async fn get(
        &self,
        principal: &Principal,
        order_id: OrderId,
    ) -> Result<OrderDetails, DomainError> {
        let order = self
            .store
            .order(order_id)
            .await?
            .ok_or(DomainError::OrderNotFound { order_id })?;
        policy::require_self_or_admin(principal, order.user_id)?;
        self.with_details(order).await
    }

    /// Lists a user's orders with item and user detail. Owner or admin.
    #[tracing::instrument(skip(self))]
    pub async fn for_user(
        &self,
        principal: &Principal,
        user_id: UserId,
    ) -> Result<Vec<OrderDetails>, DomainError> {
        policy::require_self_or_admin(principal, user_id)?;
        let orders = self.store.orders_for_user(user_id).await?;
        let mut details = Vec::with_capacity(orders.len());
        for order in orders {
            details.push(self.with_details(order).await?);
        }
        Ok(details)
    }

    /// Lists every order with item and user detail. Admin only.
    #[tracing::instrument(skip(self))]
    pub async fn all(&self, principal: &Principal) -> Result<Vec<OrderDetails>, DomainError> {
        policy::require_admin(principal)?;
        let orders = self.store.orders().await?;
        let mut details = Vec::with_capacity(orders.len());
        for order in orders {
            details.push(self.with_details(order).await?);
        }
        Ok(details)
    }

    async fn with_details(&self, order: Order) -> Result<OrderDetails, DomainError> {
        let item =
            self.store
                .item(order.item_id)
                .await?
                .ok_or_else(|| DomainError::Inconsistent {
                    entity: "item",
                    id: order.item_id.to_string(),
                })?;
        let user =
            self.store
                .user(order.user_id)
                .await?
                .ok_or_else(|| DomainError::Inconsistent {
                    entity: "user",
                    id: order.user_id.to_string(),
                })?;
        Ok(OrderDetails { order, item, user })
    }

    async fn notify_admin(&self, order: &Order) {
        let Some(admin_email) = &self.admin_email else {
            return;
        };
        let mail = Mail {
            to: admin_email.clone(),
            subject: format!("New order placed: {}", order.id),
            body: format!(
                "Order {} for item {} (quantity {}, total {}) is awaiting review.",
                order.id, order.item_id, order.quantity, order.total_price
            ),
        };
        if let Err(err) = self.mailer.send(mail).await {
            tracing::warn!(error = %err, order_id = %order.id, "failed to send admin order notice");
        }
    }

    async fn notify_customer(&self, order: &Order) {
        let user = match self.store.user(order.user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => return,
            Err(err) => {
                tracing::warn!(error = %err, order_id = %order.id, "could not load user for status notice");
                return;
            }
        };
        let body = match (&order.status, &order.cancellation_reason) {
            (OrderStatus::Cancelled, Some(reason)) => format!(
                "Hello {}, your order {} has been cancelled. Reason: {reason}",
                user.name, order.id
            ),
            _ => format!(
                "Hello {}, your order {} is now '{}'.",
                user.name, order.id, order.status
            ),
        };
        let mail = Mail {
            to: user.email,
            subject: format!("Order {} status update", order.id),
            body,
        };
        if let Err(err) = self.mailer.send(mail).await {
            tracing::warn!(error = %err, order_id = %order.id, "failed to send status notice");
        }
    }
}

fn required(value: Option<&str>, field: &'static str) -> Result<String, DomainError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(DomainError::MissingField { field }),
    }
}
