use super::hasher::PasswordHasher;
use anyhow::Result;
use secrecy::{ExposeSecret, SecretString};
use uuid::Uuid;

/// Username/password pair supplied by a caller.
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// A user that has not been written to a store yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub salt: String,
}

impl NewUser {
    #[must_use]
    pub fn new(username: String, password_hash: String, salt: String) -> Self {
        Self {
            username,
            password_hash,
            salt,
        }
    }
}

/// A persisted user. Only stores construct this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub salt: String,
}

impl User {
    #[must_use]
    pub fn from_new(id: Uuid, new_user: NewUser) -> Self {
        Self {
            id,
            username: new_user.username,
            password_hash: new_user.password_hash,
            salt: new_user.salt,
        }
    }

    /// Check a candidate password against the stored hash.
    ///
    /// The comparison is delegated to the hasher's verify routine, which
    /// reads the salt encoded in `password_hash`.
    ///
    /// # Errors
    /// Returns an error if the stored hash cannot be parsed or verification fails
    /// for a reason other than a mismatch.
    pub async fn validate_password(
        &self,
        hasher: &dyn PasswordHasher,
        candidate: &SecretString,
    ) -> Result<bool> {
        hasher
            .verify(candidate.expose_secret(), &self.password_hash)
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::credentials::hasher::{Argon2Hasher, WorkFactor};

    fn hasher() -> Argon2Hasher {
        Argon2Hasher::new(WorkFactor {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap()
    }

    async fn user_with_password(hasher: &Argon2Hasher, password: &str) -> User {
        let salt = hasher.generate_salt();
        let password_hash = hasher.hash(password, &salt).await.unwrap();
        User::from_new(
            Uuid::new_v4(),
            NewUser::new("TestUser".to_string(), password_hash, salt),
        )
    }

    #[test]
    fn credentials_debug_redacts_password() {
        let credentials = Credentials::new("TestUser", "TestPassword");
        let debug = format!("{credentials:?}");
        assert!(debug.contains("TestUser"));
        assert!(!debug.contains("TestPassword"));
    }

    #[tokio::test]
    async fn validate_password_accepts_original() {
        let hasher = hasher();
        let user = user_with_password(&hasher, "TestPassword").await;
        let candidate = SecretString::from("TestPassword".to_string());

        assert!(user.validate_password(&hasher, &candidate).await.unwrap());
    }

    #[tokio::test]
    async fn validate_password_rejects_other() {
        let hasher = hasher();
        let user = user_with_password(&hasher, "TestPassword").await;
        let candidate = SecretString::from("WrongPassword".to_string());

        assert!(!user.validate_password(&hasher, &candidate).await.unwrap());
    }

    #[tokio::test]
    async fn validate_password_does_not_mutate_record() {
        let hasher = hasher();
        let user = user_with_password(&hasher, "TestPassword").await;
        let before = user.clone();
        let candidate = SecretString::from("TestPassword".to_string());

        let _ = user.validate_password(&hasher, &candidate).await.unwrap();
        assert_eq!(user, before);
    }
}
