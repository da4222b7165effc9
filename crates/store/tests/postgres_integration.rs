//! PostgreSQL store integration tests.
//!
//! These tests share one PostgreSQL container. Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration
//! ```

use std::sync::Arc;

use chrono::Utc;
use common::{ItemId, Money, OrderId, OrderStatus, ReviewId, Role, ServiceType, UserId};
use serial_test::serial;
use sqlx::PgPool;
use store::{Item, Order, PostgresStore, Review, Store, StoreError, User};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            // Create a temporary pool just for the schema
            let temp_pool = PgPool::connect(&connection_string).await.unwrap();

            sqlx::raw_sql(include_str!("../../../migrations/001_create_tables.sql"))
                .execute(&temp_pool)
                .await
                .unwrap();

            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE reviews, orders, items, users CASCADE")
        .execute(&pool)
        .await
        .unwrap();

    PostgresStore::new(pool)
}

fn test_user(email: &str, role: Role) -> User {
    User {
        id: UserId::new(),
        name: "Test User".to_string(),
        email: email.to_string(),
        password_hash: "salt$digest".to_string(),
        role,
        created_at: Utc::now(),
    }
}

fn test_item(name: &str, category: &str, price_cents: i64, stock: u32) -> Item {
    Item {
        id: ItemId::new(),
        name: name.to_string(),
        description: Some("description".to_string()),
        image_url: None,
        price: Money::from_cents(price_cents),
        category: category.to_string(),
        stock_quantity: stock,
        created_at: Utc::now(),
    }
}

fn test_order(user_id: UserId, item: &Item, quantity: u32) -> Order {
    Order {
        id: OrderId::new(),
        user_id,
        item_id: item.id,
        service_type: ServiceType::Delivery,
        status: OrderStatus::Pending,
        quantity,
        total_price: item.price.multiply(quantity),
        delivery_address: Some("12 Main St".to_string()),
        scheduled_time: None,
        mobile_number: "5550100".to_string(),
        cancellation_reason: None,
        created_at: Utc::now(),
    }
}

#[tokio::test]
#[serial]
async fn user_roundtrip_and_duplicate_email() {
    let store = get_test_store().await;

    let user = store
        .insert_user(test_user("a@example.com", Role::Customer))
        .await
        .unwrap();
    let loaded = store.user(user.id).await.unwrap().unwrap();
    assert_eq!(loaded, user);

    let by_email = store.user_by_email("a@example.com").await.unwrap().unwrap();
    assert_eq!(by_email.id, user.id);

    let err = store
        .insert_user(test_user("a@example.com", Role::Admin))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::EmailTaken(_)));

    store.update_password(user.id, "new$hash").await.unwrap();
    assert_eq!(
        store.user(user.id).await.unwrap().unwrap().password_hash,
        "new$hash"
    );
}

#[tokio::test]
#[serial]
async fn item_listing_filter_and_categories() {
    let store = get_test_store().await;

    store
        .insert_item(test_item("Mango", "fruits", 12000, 50))
        .await
        .unwrap();
    store
        .insert_item(test_item("Milk", "dairy", 6000, 100))
        .await
        .unwrap();

    assert_eq!(store.items(None).await.unwrap().len(), 2);
    let fruits = store.items(Some("fruits")).await.unwrap();
    assert_eq!(fruits.len(), 1);
    assert_eq!(fruits[0].name, "Mango");
    assert!(store.items(Some("fruit")).await.unwrap().is_empty());

    let mut categories = store.categories().await.unwrap();
    categories.sort();
    assert_eq!(categories, vec!["dairy", "fruits"]);
}

#[tokio::test]
#[serial]
async fn order_insert_reserves_stock_conditionally() {
    let store = get_test_store().await;
    let user = store
        .insert_user(test_user("a@example.com", Role::Customer))
        .await
        .unwrap();
    let item = store
        .insert_item(test_item("Mango", "fruits", 5000, 3))
        .await
        .unwrap();

    let order = store
        .insert_order(test_order(user.id, &item, 2))
        .await
        .unwrap();
    assert_eq!(store.item(item.id).await.unwrap().unwrap().stock_quantity, 1);

    // Over the remaining stock: nothing is created.
    let err = store
        .insert_order(test_order(user.id, &item, 2))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InsufficientStock { .. }));
    assert_eq!(store.item(item.id).await.unwrap().unwrap().stock_quantity, 1);
    assert_eq!(store.orders().await.unwrap().len(), 1);

    // Unknown item is not-found, not insufficient stock.
    let mut ghost = test_order(user.id, &item, 1);
    ghost.item_id = ItemId::new();
    let err = store.insert_order(ghost).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { entity: "item", .. }));

    let loaded = store.order(order.id).await.unwrap().unwrap();
    assert_eq!(loaded, order);
    assert_eq!(store.orders_for_user(user.id).await.unwrap().len(), 1);
}

#[tokio::test]
#[serial]
async fn transitions_are_conditional_and_cancel_restocks() {
    let store = get_test_store().await;
    let user = store
        .insert_user(test_user("a@example.com", Role::Customer))
        .await
        .unwrap();
    let item = store
        .insert_item(test_item("Mango", "fruits", 5000, 3))
        .await
        .unwrap();
    let order = store
        .insert_order(test_order(user.id, &item, 2))
        .await
        .unwrap();

    let confirmed = store
        .transition_order(order.id, OrderStatus::Pending, OrderStatus::Confirmed, None)
        .await
        .unwrap();
    assert_eq!(confirmed.status, OrderStatus::Confirmed);
    assert_eq!(store.item(item.id).await.unwrap().unwrap().stock_quantity, 1);

    // Losing the conditional write reports the observed status.
    let err = store
        .transition_order(order.id, OrderStatus::Pending, OrderStatus::Confirmed, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::StatusConflict {
            actual: OrderStatus::Confirmed,
            ..
        }
    ));

    // A separate pending order cancels and restocks atomically.
    let other = store
        .insert_order(test_order(user.id, &item, 1))
        .await
        .unwrap();
    let cancelled = store
        .transition_order(
            other.id,
            OrderStatus::Pending,
            OrderStatus::Cancelled,
            Some("Out of delivery area"),
        )
        .await
        .unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(
        cancelled.cancellation_reason.as_deref(),
        Some("Out of delivery area")
    );
    assert_eq!(store.item(item.id).await.unwrap().unwrap().stock_quantity, 1);

    let err = store
        .transition_order(
            OrderId::new(),
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { entity: "order", .. }));
}

#[tokio::test]
#[serial]
async fn review_uniqueness_and_listing_order() {
    let store = get_test_store().await;
    let user = store
        .insert_user(test_user("a@example.com", Role::Customer))
        .await
        .unwrap();
    let other = store
        .insert_user(test_user("b@example.com", Role::Customer))
        .await
        .unwrap();
    let item = store
        .insert_item(test_item("Mango", "fruits", 5000, 3))
        .await
        .unwrap();

    let first = Review {
        id: ReviewId::new(),
        user_id: user.id,
        item_id: item.id,
        rating: 4,
        comment: Some("Good".to_string()),
        created_at: Utc::now(),
    };
    store.insert_review(first.clone()).await.unwrap();

    let err = store
        .insert_review(Review {
            id: ReviewId::new(),
            rating: 2,
            ..first.clone()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::DuplicateReview { .. }));

    store
        .insert_review(Review {
            id: ReviewId::new(),
            user_id: other.id,
            item_id: item.id,
            rating: 5,
            comment: None,
            created_at: Utc::now() + chrono::Duration::seconds(1),
        })
        .await
        .unwrap();

    assert_eq!(store.reviews_for_item(item.id).await.unwrap().len(), 2);
    assert_eq!(store.reviews_for_user(user.id).await.unwrap().len(), 1);

    let newest_first = store.reviews().await.unwrap();
    assert_eq!(newest_first[0].rating, 5);
    assert_eq!(newest_first[1].rating, 4);
}
