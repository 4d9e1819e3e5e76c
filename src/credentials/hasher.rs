//! Salted one-way password hashing.
//!
//! [`PasswordHasher`] is the hash primitive the repository depends on;
//! [`Argon2Hasher`] is the production implementation (Argon2id, PHC string
//! output). Hashing is CPU-bound, so the Argon2 work runs on the blocking pool.

use anyhow::{Context, Result, anyhow};
use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher as _, PasswordVerifier as _, Version,
    password_hash::SaltString,
};
use async_trait::async_trait;
use rand::rngs::OsRng;
use tokio::task;

/// Memory cost in KiB (OWASP baseline for Argon2id).
pub const DEFAULT_MEMORY_KIB: u32 = 19_456;
pub const DEFAULT_ITERATIONS: u32 = 2;
pub const DEFAULT_PARALLELISM: u32 = 1;

#[async_trait]
pub trait PasswordHasher: Send + Sync {
    /// Create a fresh random salt for a new user.
    fn generate_salt(&self) -> String;

    /// Hash `password` with `salt`; the output is self-describing and can be
    /// passed to [`PasswordHasher::verify`].
    async fn hash(&self, password: &str, salt: &str) -> Result<String>;

    /// Check `password` against a hash produced by [`PasswordHasher::hash`].
    async fn verify(&self, password: &str, password_hash: &str) -> Result<bool>;
}

/// Argon2 work factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkFactor {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for WorkFactor {
    fn default() -> Self {
        Self {
            memory_kib: DEFAULT_MEMORY_KIB,
            iterations: DEFAULT_ITERATIONS,
            parallelism: DEFAULT_PARALLELISM,
        }
    }
}

#[derive(Clone)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl Argon2Hasher {
    /// Build an Argon2id hasher with the given work factor.
    ///
    /// # Errors
    /// Returns an error if the parameters are outside the ranges Argon2 accepts.
    pub fn new(work_factor: WorkFactor) -> Result<Self> {
        let params = Params::new(
            work_factor.memory_kib,
            work_factor.iterations,
            work_factor.parallelism,
            None,
        )
        .map_err(|e| anyhow!("invalid Argon2 parameters: {e}"))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }
}

impl std::fmt::Debug for Argon2Hasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Argon2Hasher")
            .field("algorithm", &"argon2id")
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl PasswordHasher for Argon2Hasher {
    fn generate_salt(&self) -> String {
        SaltString::generate(&mut OsRng).as_str().to_string()
    }

    async fn hash(&self, password: &str, salt: &str) -> Result<String> {
        let argon2 = self.argon2.clone();
        let password = password.to_owned();
        let salt = SaltString::from_b64(salt).map_err(|e| anyhow!("invalid salt: {e}"))?;

        task::spawn_blocking(move || {
            argon2
                .hash_password(password.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|e| anyhow!("failed to hash password: {e}"))
        })
        .await
        .context("password hashing task failed")?
    }

    async fn verify(&self, password: &str, password_hash: &str) -> Result<bool> {
        let argon2 = self.argon2.clone();
        let password = password.to_owned();
        let password_hash = password_hash.to_owned();

        task::spawn_blocking(move || {
            let parsed = PasswordHash::new(&password_hash)
                .map_err(|e| anyhow!("invalid stored password hash: {e}"))?;

            match argon2.verify_password(password.as_bytes(), &parsed) {
                Ok(()) => Ok(true),
                Err(argon2::password_hash::Error::Password) => Ok(false),
                Err(e) => Err(anyhow!("failed to verify password: {e}")),
            }
        })
        .await
        .context("password verification task failed")?
    }
}
