//! Review aggregator.

use chrono::Utc;
use common::{ItemId, Principal, ReviewId, UserId};
use store::{Review, Store};

use crate::error::DomainError;
use crate::policy;

/// Input for submitting a review.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub item_id: ItemId,
    pub rating: u8,
    pub comment: Option<String>,
}

/// A review joined with the submitter's display name.
#[derive(Debug, Clone)]
pub struct ReviewWithAuthor {
    pub review: Review,
    pub user_name: String,
}

/// Pure projection over stored reviews: mean rating rounded to one
/// decimal, and the count. `(None, 0)` with no reviews.
pub fn rating_summary(reviews: &[Review]) -> (Option<f64>, u32) {
    let count = reviews.len() as u32;
    if count == 0 {
        return (None, 0);
    }
    let sum: u32 = reviews.iter().map(|r| u32::from(r.rating)).sum();
    let mean = f64::from(sum) / f64::from(count);
    (Some((mean * 10.0).round() / 10.0), count)
}

/// Service recording and surfacing item ratings.
///
/// Reviews are immutable once stored, and each user may review an item at
/// most once.
#[derive(Clone)]
pub struct ReviewService<S> {
    store: S,
}

impl<S: Store> ReviewService<S> {
    /// Creates a new review service.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Records a review by the principal.
    #[tracing::instrument(skip(self, new_review), fields(item_id = %new_review.item_id))]
    pub async fn create(
        &self,
        principal: &Principal,
        new_review: NewReview,
    ) -> Result<Review, DomainError> {
        if !(1..=5).contains(&new_review.rating) {
            return Err(DomainError::InvalidRating {
                rating: new_review.rating,
            });
        }
        if self.store.item(new_review.item_id).await?.is_none() {
            return Err(DomainError::UnknownItem {
                item_id: new_review.item_id,
            });
        }

        let review = self
            .store
            .insert_review(Review {
                id: ReviewId::new(),
                user_id: principal.user_id,
                item_id: new_review.item_id,
                rating: new_review.rating,
                comment: new_review.comment,
                created_at: Utc::now(),
            })
            .await?;

        metrics::counter!("reviews_created").increment(1);
        tracing::info!(review_id = %review.id, rating = review.rating, "review created");
        Ok(review)
    }

    /// Lists every review with its author's display name, most recent
    /// first. Backs the public rotating feed.
    #[tracing::instrument(skip(self))]
    pub async fn all(&self) -> Result<Vec<ReviewWithAuthor>, DomainError> {
        let reviews = self.store.reviews().await?;
        let mut joined = Vec::with_capacity(reviews.len());
        for review in reviews {
            let user_name = match self.store.user(review.user_id).await? {
                Some(user) => user.name,
                None => "Unknown".to_string(),
            };
            joined.push(ReviewWithAuthor { review, user_name });
        }
        Ok(joined)
    }

    /// Lists reviews for an item.
    #[tracing::instrument(skip(self))]
    pub async fn for_item(&self, item_id: ItemId) -> Result<Vec<Review>, DomainError> {
        if self.store.item(item_id).await?.is_none() {
            return Err(DomainError::ItemNotFound { item_id });
        }
        Ok(self.store.reviews_for_item(item_id).await?)
    }

    /// Lists reviews written by a user. Owner or admin.
    #[tracing::instrument(skip(self))]
    pub async fn for_user(
        &self,
        principal: &Principal,
        user_id: UserId,
    ) -> Result<Vec<Review>, DomainError> {
        policy::require_self_or_admin(principal, user_id)?;
        Ok(self.store.reviews_for_user(user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use common::{Money, Role};
    use store::{InMemoryStore, Item, User};

    use super::*;

    async fn seed_user(store: &InMemoryStore, name: &str) -> User {
        store
            .insert_user(User {
                id: UserId::new(),
                name: name.to_string(),
                email: format!("{}@example.com", UserId::new()),
                password_hash: "hash".to_string(),
                role: Role::Customer,
                created_at: Utc::now(),
            })
            .await
            .unwrap()
    }

    async fn seed_item(store: &InMemoryStore) -> Item {
        store
            .insert_item(Item {
                id: ItemId::new(),
                name: "Coconut Water".to_string(),
                description: None,
                image_url: None,
                price: Money::from_cents(4500),
                category: "beverages".to_string(),
                stock_quantity: 20,
                created_at: Utc::now(),
            })
            .await
            .unwrap()
    }

    fn review(rating: u8) -> Review {
        Review {
            id: ReviewId::new(),
            user_id: UserId::new(),
            item_id: ItemId::new(),
            rating,
            comment: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn rating_summary_rounds_to_one_decimal() {
        assert_eq!(rating_summary(&[]), (None, 0));
        assert_eq!(
            rating_summary(&[review(5), review(4), review(3)]),
            (Some(4.0), 3)
        );
        assert_eq!(rating_summary(&[review(5), review(4)]), (Some(4.5), 2));
        assert_eq!(
            rating_summary(&[review(2), review(3), review(3)]),
            (Some(2.7), 3)
        );
    }

    #[tokio::test]
    async fn create_validates_rating_bounds() {
        let store = InMemoryStore::new();
        let user = seed_user(&store, "Jordan").await;
        let item = seed_item(&store).await;
        let service = ReviewService::new(store);
        let principal = Principal::new(user.id, Role::Customer);

        for rating in [0, 6] {
            let err = service
                .create(
                    &principal,
                    NewReview {
                        item_id: item.id,
                        rating,
                        comment: None,
                    },
                )
                .await
                .unwrap_err();
            assert!(matches!(err, DomainError::InvalidRating { .. }));
        }
    }

    #[tokio::test]
    async fn create_rejects_unknown_item() {
        let store = InMemoryStore::new();
        let user = seed_user(&store, "Jordan").await;
        let service = ReviewService::new(store);
        let principal = Principal::new(user.id, Role::Customer);

        let err = service
            .create(
                &principal,
                NewReview {
                    item_id: ItemId::new(),
                    rating: 4,
                    comment: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::UnknownItem { .. }));
    }

    #[tokio::test]
    async fn one_review_per_user_and_item() {
        let store = InMemoryStore::new();
        let user = seed_user(&store, "Jordan").await;
        let item = seed_item(&store).await;
        let service = ReviewService::new(store);
        let principal = Principal::new(user.id, Role::Customer);

        service
            .create(
                &principal,
                NewReview {
                    item_id: item.id,
                    rating: 5,
                    comment: Some("Great".to_string()),
                },
            )
            .await
            .unwrap();

        let err = service
            .create(
                &principal,
                NewReview {
                    item_id: item.id,
                    rating: 2,
                    comment: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::AlreadyReviewed { .. }));
    }

    #[tokio::test]
    async fn feed_joins_author_names_newest_first() {
        let store = InMemoryStore::new();
        let first = seed_user(&store, "First").await;
        let second = seed_user(&store, "Second").await;
        let item = seed_item(&store).await;
        let service = ReviewService::new(store);

        service
            .create(
                &Principal::new(first.id, Role::Customer),
                NewReview {
                    item_id: item.id,
                    rating: 4,
                    comment: None,
                },
            )
            .await
            .unwrap();
        service
            .create(
                &Principal::new(second.id, Role::Customer),
                NewReview {
                    item_id: item.id,
                    rating: 5,
                    comment: None,
                },
            )
            .await
            .unwrap();

        let feed = service.all().await.unwrap();
        assert_eq!(feed.len(), 2);
        assert_eq!(feed[0].user_name, "Second");
        assert_eq!(feed[1].user_name, "First");
    }

    #[tokio::test]
    async fn user_reviews_are_owner_or_admin_gated() {
        let store = InMemoryStore::new();
        let author = seed_user(&store, "Author").await;
        let stranger = seed_user(&store, "Stranger").await;
        let item = seed_item(&store).await;
        let service = ReviewService::new(store);

        service
            .create(
                &Principal::new(author.id, Role::Customer),
                NewReview {
                    item_id: item.id,
                    rating: 3,
                    comment: None,
                },
            )
            .await
            .unwrap();

        assert!(matches!(
            service
                .for_user(&Principal::new(stranger.id, Role::Customer), author.id)
                .await
                .unwrap_err(),
            DomainError::Forbidden
        ));
        assert_eq!(
            service
                .for_user(&Principal::new(author.id, Role::Customer), author.id)
                .await
                .unwrap()
                .len(),
            1
        );
        assert_eq!(
            service
                .for_user(&Principal::new(stranger.id, Role::Admin), author.id)
                .await
                .unwrap()
                .len(),
            1
        );
    }
}
