use super::user::{NewUser, User};
use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

/// Outcome of a failed [`UserStore::save`].
#[derive(Debug, Error)]
pub enum SaveError {
    /// The store rejected the row because the username is already taken.
    #[error("username already exists")]
    Conflict,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Persistence boundary for user records.
///
/// Implementations must enforce username uniqueness atomically: when two
/// saves race for the same username, exactly one succeeds and the other
/// returns [`SaveError::Conflict`].
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persist `user` and return the stored record.
    async fn save(&self, user: NewUser) -> Result<User, SaveError>;

    /// Look up a user by exact (case-sensitive) username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Check that the store is reachable.
    async fn ping(&self) -> Result<()>;
}
