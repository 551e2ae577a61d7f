//! League Portal shared primitives
//!
//! Building blocks used by every league crate:
//!
//! - [`JsonFile`]: wholesale, pretty-printed JSON document persistence
//! - [`money`]: lenient amount coercion and display formatting
//! - [`password`]: salted argon2 hashing with constant-time verification
//! - [`StoreError`]: persistence failure taxonomy

pub mod error;
pub mod money;
pub mod password;
pub mod persistence;

pub use error::{PasswordError, StoreError, StoreResult};
pub use money::{format_amount, format_currency, parse_amount};
pub use password::{generate_temporary_password, hash_password, verify_password};
pub use persistence::JsonFile;
