//! Infrastructure layer: storage adapters, password hashing, config, seeding.

pub mod config;
pub mod crypto;
pub mod memory;
pub mod postgres;
pub mod seed;

pub use config::{BootstrapAdmin, ConfigError, Settings};
pub use crypto::Argon2PasswordHasher;
pub use memory::{InMemoryAttachmentStore, InMemoryAuthStore, InMemoryLetterStore};
pub use postgres::PgStore;

#[cfg(test)]
mod integration_tests;
