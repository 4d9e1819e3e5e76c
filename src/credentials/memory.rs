//! In-process [`UserStore`], used by tests and `--in-memory` mode.

use super::{
    store::{SaveError, UserStore},
    user::{NewUser, User},
};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<String, User>>,
}

impl MemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn save(&self, user: NewUser) -> Result<User, SaveError> {
        // Check and insert under one write lock so racing saves cannot both win.
        let mut users = self.users.write().await;

        if users.contains_key(&user.username) {
            debug!("username already taken");
            return Err(SaveError::Conflict);
        }

        let stored = User::from_new(Uuid::new_v4(), user);
        users.insert(stored.username.clone(), stored.clone());

        Ok(stored)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self.users.read().await.get(username).cloned())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
