use super::{
    error::CredentialError,
    hasher::PasswordHasher,
    store::{SaveError, UserStore},
    user::{Credentials, NewUser},
};
use anyhow::Result;
use secrecy::ExposeSecret;
use std::sync::Arc;
use tracing::{debug, error, instrument};

/// Sign-up and password validation on top of a [`UserStore`].
///
/// The repository holds no mutable state; share it behind an `Arc`.
#[derive(Clone)]
pub struct UserRepository {
    store: Arc<dyn UserStore>,
    hasher: Arc<dyn PasswordHasher>,
}

impl UserRepository {
    #[must_use]
    pub fn new(store: Arc<dyn UserStore>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { store, hasher }
    }

    #[must_use]
    pub fn store(&self) -> &dyn UserStore {
        self.store.as_ref()
    }

    /// Register a new user.
    ///
    /// The password is hashed once, before the write is attempted.
    ///
    /// # Errors
    /// [`CredentialError::DuplicateUsername`] if the username is taken,
    /// [`CredentialError::Store`] for any other persistence failure and
    /// [`CredentialError::Hashing`] if the password could not be hashed.
    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    pub async fn sign_up(&self, credentials: &Credentials) -> Result<(), CredentialError> {
        let salt = self.hasher.generate_salt();
        let password_hash = self
            .hash_password(credentials.password.expose_secret(), &salt)
            .await
            .map_err(CredentialError::Hashing)?;

        let user = NewUser::new(credentials.username.clone(), password_hash, salt);

        match self.store.save(user).await {
            Ok(user) => {
                debug!(user_id = %user.id, "user created");
                Ok(())
            }
            Err(SaveError::Conflict) => {
                debug!("username already exists");
                Err(CredentialError::DuplicateUsername)
            }
            Err(SaveError::Other(e)) => {
                error!("Error saving user: {:?}", e);
                Err(CredentialError::Store(e))
            }
        }
    }

    /// Check a username/password pair.
    ///
    /// Returns the stored username when the password matches, `None` when the
    /// user does not exist or the password is wrong. The hash comparison is
    /// skipped entirely for unknown users.
    ///
    /// # Errors
    /// [`CredentialError::Store`] if the lookup fails and
    /// [`CredentialError::Hashing`] if the stored hash cannot be verified.
    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    pub async fn validate_user_password(
        &self,
        credentials: &Credentials,
    ) -> Result<Option<String>, CredentialError> {
        let user = match self.store.find_by_username(&credentials.username).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                debug!("user not found");
                return Ok(None);
            }
            Err(e) => {
                error!("Error looking up user: {:?}", e);
                return Err(CredentialError::Store(e));
            }
        };

        let valid = user
            .validate_password(self.hasher.as_ref(), &credentials.password)
            .await
            .map_err(|e| {
                error!("Error verifying password: {:?}", e);
                CredentialError::Hashing(e)
            })?;

        if valid {
            Ok(Some(user.username))
        } else {
            debug!("password mismatch");
            Ok(None)
        }
    }

    /// Hash `password` with `salt` using the configured hasher.
    ///
    /// # Errors
    /// Returns an error if the hasher fails.
    pub async fn hash_password(&self, password: &str, salt: &str) -> Result<String> {
        self.hasher.hash(password, salt).await
    }
}

impl std::fmt::Debug for UserRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRepository").finish_non_exhaustive()
    }
}
