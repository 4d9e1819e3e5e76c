//! Credential lifecycle: hashing, sign-up and password validation.
//!
//! [`UserRepository`] depends only on the [`UserStore`] and [`PasswordHasher`]
//! traits. Production wiring uses [`PgUserStore`] and [`Argon2Hasher`].

pub mod error;
pub mod hasher;
pub mod memory;
pub mod postgres;
pub mod repository;
pub mod store;
pub mod user;

pub use self::error::CredentialError;
pub use self::hasher::{Argon2Hasher, PasswordHasher, WorkFactor};
pub use self::memory::MemoryUserStore;
pub use self::postgres::PgUserStore;
pub use self::repository::UserRepository;
pub use self::store::{SaveError, UserStore};
pub use self::user::{Credentials, NewUser, User};
