//! In-memory store implementation.

use std::sync::Arc;

use async_trait::async_trait;
use common::{ItemId, OrderId, OrderStatus, UserId};
use tokio::sync::RwLock;

use crate::record::{Item, Order, Review, User};
use crate::store::Store;
use crate::{Result, StoreError};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    items: Vec<Item>,
    orders: Vec<Order>,
    reviews: Vec<Review>,
}

/// In-memory store for tests and development.
///
/// All tables live behind one `RwLock`, so every multi-record operation
/// runs under a single write lock and is atomic by construction. Listing
/// order is insertion order, which is the stable order the catalog
/// contract requires.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn insert_user(&self, user: User) -> Result<User> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::EmailTaken(user.email));
        }
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn user(&self, id: UserId) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn update_password(&self, id: UserId, password_hash: &str) -> Result<()> {
        let mut tables = self.tables.write().await;
        let user = tables
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "user",
                id: id.to_string(),
            })?;
        user.password_hash = password_hash.to_string();
        Ok(())
    }

    async fn insert_item(&self, item: Item) -> Result<Item> {
        let mut tables = self.tables.write().await;
        tables.items.push(item.clone());
        Ok(item)
    }

    async fn update_item(&self, item: Item) -> Result<Item> {
        let mut tables = self.tables.write().await;
        let slot = tables
            .items
            .iter_mut()
            .find(|i| i.id == item.id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "item",
                id: item.id.to_string(),
            })?;
        *slot = item.clone();
        Ok(item)
    }

    async fn item(&self, id: ItemId) -> Result<Option<Item>> {
        let tables = self.tables.read().await;
        Ok(tables.items.iter().find(|i| i.id == id).cloned())
    }

    async fn items(&self, category: Option<&str>) -> Result<Vec<Item>> {
        let tables = self.tables.read().await;
        Ok(tables
            .items
            .iter()
            .filter(|i| category.is_none_or(|c| i.category == c))
            .cloned()
            .collect())
    }

    async fn categories(&self) -> Result<Vec<String>> {
        let tables = self.tables.read().await;
        let mut categories: Vec<String> = Vec::new();
        for item in &tables.items {
            if !categories.contains(&item.category) {
                categories.push(item.category.clone());
            }
        }
        Ok(categories)
    }

    async fn insert_order(&self, order: Order) -> Result<Order> {
        let mut tables = self.tables.write().await;
        let item = tables
            .items
            .iter_mut()
            .find(|i| i.id == order.item_id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "item",
                id: order.item_id.to_string(),
            })?;
        if item.stock_quantity < order.quantity {
            return Err(StoreError::InsufficientStock {
                item_id: order.item_id,
                requested: order.quantity,
            });
        }
        item.stock_quantity -= order.quantity;
        tables.orders.push(order.clone());
        Ok(order)
    }

    async fn order(&self, id: OrderId) -> Result<Option<Order>> {
        let tables = self.tables.read().await;
        Ok(tables.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let tables = self.tables.read().await;
        Ok(tables
            .orders
            .iter()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn orders(&self) -> Result<Vec<Order>> {
        let tables = self.tables.read().await;
        Ok(tables.orders.clone())
    }

    async fn transition_order(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
        cancellation_reason: Option<&str>,
    ) -> Result<Order> {
        let mut tables = self.tables.write().await;
        let order = tables
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "order",
                id: id.to_string(),
            })?;
        if order.status != from {
            return Err(StoreError::StatusConflict {
                order_id: id,
                expected: from,
                actual: order.status,
            });
        }
        order.status = to;
        order.cancellation_reason = if to == OrderStatus::Cancelled {
            cancellation_reason.map(String::from)
        } else {
            None
        };
        let updated = order.clone();

        if to == OrderStatus::Cancelled {
            let item = tables
                .items
                .iter_mut()
                .find(|i| i.id == updated.item_id)
                .ok_or_else(|| StoreError::NotFound {
                    entity: "item",
                    id: updated.item_id.to_string(),
                })?;
            item.stock_quantity += updated.quantity;
        }
        Ok(updated)
    }

    async fn insert_review(&self, review: Review) -> Result<Review> {
        let mut tables = self.tables.write().await;
        if tables
            .reviews
            .iter()
            .any(|r| r.user_id == review.user_id && r.item_id == review.item_id)
        {
            return Err(StoreError::DuplicateReview {
                user_id: review.user_id,
                item_id: review.item_id,
            });
        }
        tables.reviews.push(review.clone());
        Ok(review)
    }

    async fn reviews_for_item(&self, item_id: ItemId) -> Result<Vec<Review>> {
        let tables = self.tables.read().await;
        Ok(tables
            .reviews
            .iter()
            .filter(|r| r.item_id == item_id)
            .cloned()
            .collect())
    }

    async fn reviews_for_user(&self, user_id: UserId) -> Result<Vec<Review>> {
        let tables = self.tables.read().await;
        Ok(tables
            .reviews
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn reviews(&self) -> Result<Vec<Review>> {
        let tables = self.tables.read().await;
        Ok(tables.reviews.iter().rev().cloned().collect())
    }
}
