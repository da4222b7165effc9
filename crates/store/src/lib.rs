//! Datastore abstraction for the storefront service.
//!
//! A single shared datastore behind the [`Store`] trait, with an in-memory
//! implementation for tests and development and a PostgreSQL implementation
//! for production. The store owns the two cross-record atomic operations:
//! conditional stock reservation when an order is inserted, and stock
//! release fused with the status write when an order is cancelled.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod record;
pub mod store;

pub use common::{ItemId, OrderId, ReviewId, UserId};
pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use record::{Item, Order, Review, User};
pub use store::Store;
