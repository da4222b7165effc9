//! Catalog reads.

use common::ItemId;
use store::{Item, Review, Store};

use crate::error::DomainError;
use crate::reviews::rating_summary;

/// An item joined with its reviews and the derived rating aggregates.
#[derive(Debug, Clone)]
pub struct ItemDetails {
    pub item: Item,
    pub reviews: Vec<Review>,
    /// Arithmetic mean of ratings rounded to one decimal; `None` with no
    /// reviews.
    pub average_rating: Option<f64>,
    pub review_count: u32,
}

/// Read-only catalog service.
///
/// Catalog mutation is a management concern outside this service; only
/// listing, lookup, and category enumeration are exposed.
#[derive(Clone)]
pub struct CatalogService<S> {
    store: S,
}

impl<S: Store> CatalogService<S> {
    /// Creates a new catalog service.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Lists items in a stable order, optionally filtered by exact
    /// category match.
    #[tracing::instrument(skip(self))]
    pub async fn items(&self, category: Option<&str>) -> Result<Vec<Item>, DomainError> {
        Ok(self.store.items(category).await?)
    }

    /// Loads one item with its reviews and rating aggregates.
    #[tracing::instrument(skip(self))]
    pub async fn item(&self, item_id: ItemId) -> Result<ItemDetails, DomainError> {
        let item = self
            .store
            .item(item_id)
            .await?
            .ok_or(DomainError::ItemNotFound { item_id })?;
        let reviews = self.store.reviews_for_item(item_id).await?;
        let (average_rating, review_count) = rating_summary(&reviews);
        Ok(ItemDetails {
            item,
            reviews,
            average_rating,
            review_count,
        })
    }

    /// Returns the distinct categories present in the catalog.
    #[tracing::instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<String>, DomainError> {
        Ok(self.store.categories().await?)
    }
}
