//! The store trait.

use async_trait::async_trait;
use common::{ItemId, OrderId, OrderStatus, UserId};

use crate::Result;
use crate::record::{Item, Order, Review, User};

/// The shared datastore behind every service.
///
/// All operations are synchronous request/response against one store; there
/// are no streams, background writers, or timers. Two operations are
/// atomic across records:
///
/// - [`insert_order`](Store::insert_order) conditionally decrements the
///   item's stock and inserts the order as one unit, so two concurrent
///   inserts can never jointly oversell;
/// - [`transition_order`](Store::transition_order) writes the new status
///   conditionally on the expected prior status, and on cancellation
///   releases the reserved stock in the same unit.
#[async_trait]
pub trait Store: Send + Sync {
    // -- Users --

    /// Inserts a new user. Fails with `EmailTaken` on a duplicate email.
    async fn insert_user(&self, user: User) -> Result<User>;

    /// Looks up a user by id.
    async fn user(&self, id: UserId) -> Result<Option<User>>;

    /// Looks up a user by email.
    async fn user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Replaces a user's password hash.
    async fn update_password(&self, id: UserId, password_hash: &str) -> Result<()>;

    // -- Items --

    /// Inserts a new catalog item.
    async fn insert_item(&self, item: Item) -> Result<Item>;

    /// Replaces a catalog item (catalog-management write).
    async fn update_item(&self, item: Item) -> Result<Item>;

    /// Looks up an item by id.
    async fn item(&self, id: ItemId) -> Result<Option<Item>>;

    /// Lists items in a stable order, optionally filtered by exact category.
    async fn items(&self, category: Option<&str>) -> Result<Vec<Item>>;

    /// Returns the distinct categories present in the catalog.
    async fn categories(&self) -> Result<Vec<String>>;

    // -- Orders --

    /// Atomically reserves stock and inserts the order.
    ///
    /// The stock decrement is conditional on `stock_quantity >=
    /// order.quantity`; when the condition fails nothing is created and
    /// `InsufficientStock` is returned. A missing item is `NotFound`.
    async fn insert_order(&self, order: Order) -> Result<Order>;

    /// Looks up an order by id.
    async fn order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Lists all orders placed by a user, oldest first.
    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>>;

    /// Lists every order, oldest first.
    async fn orders(&self) -> Result<Vec<Order>>;

    /// Moves an order from `from` to `to`, conditionally on its current
    /// status still being `from`.
    ///
    /// A lost race returns `StatusConflict` carrying the observed status.
    /// When `to` is cancelled, the reason is stored and the order's
    /// quantity is released back to the item's stock in the same atomic
    /// unit; no other transition touches stock.
    async fn transition_order(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
        cancellation_reason: Option<&str>,
    ) -> Result<Order>;

    // -- Reviews --

    /// Inserts a review. Fails with `DuplicateReview` when the user has
    /// already reviewed the item.
    async fn insert_review(&self, review: Review) -> Result<Review>;

    /// Lists reviews for an item, oldest first.
    async fn reviews_for_item(&self, item_id: ItemId) -> Result<Vec<Review>>;

    /// Lists reviews written by a user, oldest first.
    async fn reviews_for_user(&self, user_id: UserId) -> Result<Vec<Review>>;

    /// Lists every review, most recent first.
    async fn reviews(&self) -> Result<Vec<Review>>;
}
