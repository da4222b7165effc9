//! PostgreSQL store implementation.

use async_trait::async_trait;
use common::{ItemId, Money, OrderId, OrderStatus, ReviewId, UserId};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::record::{Item, Order, Review, User};
use crate::store::Store;
use crate::{Result, StoreError};

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the database and wraps the pool.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn parse_column<T: std::str::FromStr>(column: &'static str, value: String) -> Result<T> {
        value
            .parse()
            .map_err(|_| StoreError::InvalidColumn { column, value })
    }

    fn row_to_user(row: &PgRow) -> Result<User> {
        Ok(User {
            id: UserId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            role: Self::parse_column("role", row.try_get("role")?)?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_item(row: &PgRow) -> Result<Item> {
        Ok(Item {
            id: ItemId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            image_url: row.try_get("image_url")?,
            price: Money::from_cents(row.try_get("price_cents")?),
            category: row.try_get("category")?,
            stock_quantity: row.try_get::<i32, _>("stock_quantity")? as u32,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_order(row: &PgRow) -> Result<Order> {
        Ok(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            item_id: ItemId::from_uuid(row.try_get::<Uuid, _>("item_id")?),
            service_type: Self::parse_column("service_type", row.try_get("service_type")?)?,
            status: Self::parse_column("status", row.try_get("status")?)?,
            quantity: row.try_get::<i32, _>("quantity")? as u32,
            total_price: Money::from_cents(row.try_get("total_price_cents")?),
            delivery_address: row.try_get("delivery_address")?,
            scheduled_time: row.try_get("scheduled_time")?,
            mobile_number: row.try_get("mobile_number")?,
            cancellation_reason: row.try_get("cancellation_reason")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_review(row: &PgRow) -> Result<Review> {
        Ok(Review {
            id: ReviewId::from_uuid(row.try_get::<Uuid, _>("id")?),
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            item_id: ItemId::from_uuid(row.try_get::<Uuid, _>("item_id")?),
            rating: row.try_get::<i16, _>("rating")? as u8,
            comment: row.try_get("comment")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

const ORDER_COLUMNS: &str = "id, user_id, item_id, service_type, status, quantity, \
     total_price_cents, delivery_address, scheduled_time, mobile_number, \
     cancellation_reason, created_at";

#[async_trait]
impl Store for PostgresStore {
    async fn insert_user(&self, user: User) -> Result<User> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, role, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("users_email_key")
            {
                return StoreError::EmailTaken(user.email.clone());
            }
            StoreError::Database(e)
        })?;
        Ok(user)
    }

    async fn user(&self, id: UserId) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_user).transpose()
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_user).transpose()
    }

    async fn update_password(&self, id: UserId, password_hash: &str) -> Result<()> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "user",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn insert_item(&self, item: Item) -> Result<Item> {
        sqlx::query(
            r#"
            INSERT INTO items (id, name, description, image_url, price_cents, category,
                               stock_quantity, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(item.id.as_uuid())
        .bind(&item.name)
        .bind(&item.description)
        .bind(&item.image_url)
        .bind(item.price.cents())
        .bind(&item.category)
        .bind(item.stock_quantity as i32)
        .bind(item.created_at)
        .execute(&self.pool)
        .await?;
        Ok(item)
    }

    async fn update_item(&self, item: Item) -> Result<Item> {
        let result = sqlx::query(
            r#"
            UPDATE items
            SET name = $2, description = $3, image_url = $4, price_cents = $5,
                category = $6, stock_quantity = $7
            WHERE id = $1
            "#,
        )
        .bind(item.id.as_uuid())
        .bind(&item.name)
        .bind(&item.description)
        .bind(&item.image_url)
        .bind(item.price.cents())
        .bind(&item.category)
        .bind(item.stock_quantity as i32)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "item",
                id: item.id.to_string(),
            });
        }
        Ok(item)
    }

    async fn item(&self, id: ItemId) -> Result<Option<Item>> {
        let row = sqlx::query("SELECT * FROM items WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_item).transpose()
    }

    async fn items(&self, category: Option<&str>) -> Result<Vec<Item>> {
        let rows = match category {
            Some(category) => {
                sqlx::query("SELECT * FROM items WHERE category = $1 ORDER BY created_at, id")
                    .bind(category)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query("SELECT * FROM items ORDER BY created_at, id")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        rows.iter().map(Self::row_to_item).collect()
    }

    async fn categories(&self) -> Result<Vec<String>> {
        let categories =
            sqlx::query_scalar("SELECT DISTINCT category FROM items ORDER BY category")
                .fetch_all(&self.pool)
                .await?;
        Ok(categories)
    }

    async fn insert_order(&self, order: Order) -> Result<Order> {
        let mut tx = self.pool.begin().await?;

        // Conditional reservation: decrements only when enough stock remains,
        // so concurrent inserts can never jointly oversell.
        let reserved = sqlx::query(
            "UPDATE items SET stock_quantity = stock_quantity - $2 \
             WHERE id = $1 AND stock_quantity >= $2",
        )
        .bind(order.item_id.as_uuid())
        .bind(order.quantity as i32)
        .execute(&mut *tx)
        .await?;

        if reserved.rows_affected() == 0 {
            let exists: Option<i32> = sqlx::query_scalar("SELECT 1 FROM items WHERE id = $1")
                .bind(order.item_id.as_uuid())
                .fetch_optional(&mut *tx)
                .await?;
            return Err(match exists {
                Some(_) => StoreError::InsufficientStock {
                    item_id: order.item_id,
                    requested: order.quantity,
                },
                None => StoreError::NotFound {
                    entity: "item",
                    id: order.item_id.to_string(),
                },
            });
        }

        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, item_id, service_type, status, quantity,
                                total_price_cents, delivery_address, scheduled_time,
                                mobile_number, cancellation_reason, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.user_id.as_uuid())
        .bind(order.item_id.as_uuid())
        .bind(order.service_type.as_str())
        .bind(order.status.as_str())
        .bind(order.quantity as i32)
        .bind(order.total_price.cents())
        .bind(&order.delivery_address)
        .bind(order.scheduled_time)
        .bind(&order.mobile_number)
        .bind(&order.cancellation_reason)
        .bind(order.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(order)
    }

    async fn order(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query("SELECT * FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_order).transpose()
    }

    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let rows = sqlx::query("SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at, id")
            .bind(user_id.as_uuid())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(Self::row_to_order).collect()
    }

    async fn orders(&self) -> Result<Vec<Order>> {
        let rows = sqlx::query("SELECT * FROM orders ORDER BY created_at, id")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(Self::row_to_order).collect()
    }

    async fn transition_order(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
        cancellation_reason: Option<&str>,
    ) -> Result<Order> {
        let mut tx = self.pool.begin().await?;

        let reason = if to == OrderStatus::Cancelled {
            cancellation_reason
        } else {
            None
        };

        // Conditional on the expected prior status; zero rows means the
        // record is missing or another writer got there first.
        let update_sql = format!(
            "UPDATE orders SET status = $2, cancellation_reason = $3 \
             WHERE id = $1 AND status = $4 RETURNING {ORDER_COLUMNS}"
        );
        let row = sqlx::query(&update_sql)
            .bind(id.as_uuid())
            .bind(to.as_str())
            .bind(reason)
            .bind(from.as_str())
            .fetch_optional(&mut *tx)
            .await?;

        let Some(row) = row else {
            let actual: Option<String> = sqlx::query_scalar("SELECT status FROM orders WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&mut *tx)
                .await?;
            return Err(match actual {
                Some(actual) => StoreError::StatusConflict {
                    order_id: id,
                    expected: from,
                    actual: Self::parse_column("status", actual)?,
                },
                None => StoreError::NotFound {
                    entity: "order",
                    id: id.to_string(),
                },
            });
        };
        let order = Self::row_to_order(&row)?;

        if to == OrderStatus::Cancelled {
            sqlx::query("UPDATE items SET stock_quantity = stock_quantity + $2 WHERE id = $1")
                .bind(order.item_id.as_uuid())
                .bind(order.quantity as i32)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(order)
    }

    async fn insert_review(&self, review: Review) -> Result<Review> {
        sqlx::query(
            r#"
            INSERT INTO reviews (id, user_id, item_id, rating, comment, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(review.id.as_uuid())
        .bind(review.user_id.as_uuid())
        .bind(review.item_id.as_uuid())
        .bind(i16::from(review.rating))
        .bind(&review.comment)
        .bind(review.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("reviews_user_item_key")
            {
                return StoreError::DuplicateReview {
                    user_id: review.user_id,
                    item_id: review.item_id,
                };
            }
            StoreError::Database(e)
        })?;
        Ok(review)
    }

    async fn reviews_for_item(&self, item_id: ItemId) -> Result<Vec<Review>> {
        let rows = sqlx::query("SELECT * FROM reviews WHERE item_id = $1 ORDER BY created_at, id")
            .bind(item_id.as_uuid())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(Self::row_to_review).collect()
    }

    async fn reviews_for_user(&self, user_id: UserId) -> Result<Vec<Review>> {
        let rows = sqlx::query("SELECT * FROM reviews WHERE user_id = $1 ORDER BY created_at, id")
            .bind(user_id.as_uuid())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(Self::row_to_review).collect()
    }

    async fn reviews(&self) -> Result<Vec<Review>> {
        let rows = sqlx::query("SELECT * FROM reviews ORDER BY created_at DESC, id")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(Self::row_to_review).collect()
    }
}
