//! Core services for the storefront.
//!
//! Three services over the shared [`store::Store`]:
//!
//! - [`OrderService`] — the order lifecycle manager: creation with
//!   snapshot pricing and atomic stock reservation, role-gated status
//!   transitions, cancellation with stock release;
//! - [`CatalogService`] — item listing, lookup with review aggregates,
//!   category enumeration;
//! - [`ReviewService`] — rating storage and the derived-average
//!   projection.
//!
//! Every operation takes an explicit [`common::Principal`]; all role
//! gating goes through [`policy`].

pub mod catalog;
pub mod error;
pub mod orders;
pub mod policy;
pub mod reviews;

pub use catalog::{CatalogService, ItemDetails};
pub use common::{
    ItemId, Money, OrderId, OrderStatus, Principal, ReviewId, Role, ServiceType, UserId,
};
pub use error::DomainError;
pub use orders::{NewOrder, OrderDetails, OrderService};
pub use reviews::{NewReview, ReviewService, ReviewWithAuthor, rating_summary};
