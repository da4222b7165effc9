//! Startup seeding: admin bootstrap and an optional sample catalog.

use chrono::Utc;
use common::{ItemId, Money, Role, UserId};
use store::{Item, Store, StoreError, User};

use crate::config::Config;

/// Creates the admin account and, when enabled, a sample catalog.
///
/// Idempotent: the admin is only created when the email is free, and the
/// sample catalog only lands in an empty catalog.
pub async fn run<S: Store>(store: &S, config: &Config) -> Result<(), StoreError> {
    if let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password)
        && store.user_by_email(email).await?.is_none()
    {
        store
            .insert_user(User {
                id: UserId::new(),
                name: "Admin".to_string(),
                email: email.clone(),
                password_hash: auth::password::hash_password(password),
                role: Role::Admin,
                created_at: Utc::now(),
            })
            .await?;
        tracing::info!(%email, "admin account created");
    }

    if config.seed_demo && store.items(None).await?.is_empty() {
        for item in sample_items() {
            store.insert_item(item).await?;
        }
        tracing::info!("sample catalog seeded");
    }

    Ok(())
}

fn sample_items() -> Vec<Item> {
    let entries = [
        (
            "Fresh Mangoes",
            "Sweet and juicy seasonal mangoes",
            12000,
            "fruits",
            50,
        ),
        (
            "Organic Milk",
            "Pure organic milk, delivered fresh daily",
            6000,
            "dairy",
            100,
        ),
        (
            "Coconut Water",
            "Naturally refreshing, straight from the farm",
            4500,
            "beverages",
            75,
        ),
    ];
    entries
        .into_iter()
        .map(|(name, description, price_cents, category, stock)| Item {
            id: ItemId::new(),
            name: name.to_string(),
            description: Some(description.to_string()),
            image_url: None,
            price: Money::from_cents(price_cents),
            category: category.to_string(),
            stock_quantity: stock,
            created_at: Utc::now(),
        })
        .collect()
}
