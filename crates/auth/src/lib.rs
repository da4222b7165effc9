//! Identity and access for the storefront.
//!
//! Password login with salted hashes, opaque bearer tokens with a TTL,
//! and single-use password-reset tokens. Token verification is a pure
//! read and safe under unlimited parallelism.

pub mod error;
pub mod password;
pub mod service;
pub mod token;

pub use error::AuthError;
pub use service::{AuthService, MIN_PASSWORD_LEN};
