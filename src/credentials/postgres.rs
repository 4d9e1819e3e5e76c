//! Postgres-backed [`UserStore`]. Schema lives in `db/sql/01_users.sql`.

use super::{
    store::{SaveError, UserStore},
    user::{NewUser, User},
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Connection, PgPool, Row, postgres::PgPoolOptions};
use std::time::Duration;
use tracing::{Instrument, debug, info_span, instrument};
use uuid::Uuid;

/// SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a connection pool against `dsn`.
    ///
    /// # Errors
    /// Returns an error if the database is unreachable.
    pub async fn connect(dsn: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .min_connections(1)
            .max_connections(max_connections)
            .max_lifetime(Duration::from_secs(60 * 2))
            .test_before_acquire(true)
            .connect(dsn)
            .await
            .context("Failed to connect to database")?;

        Ok(Self::new(pool))
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    #[instrument(skip(self, user), fields(username = %user.username))]
    async fn save(&self, user: NewUser) -> Result<User, SaveError> {
        let query = r"
            INSERT INTO users (username, password_hash, salt)
            VALUES ($1, $2, $3)
            RETURNING id
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(&user.salt)
            .fetch_one(&self.pool)
            .instrument(span)
            .await;

        match row {
            Ok(row) => {
                let id: Uuid = row.try_get("id").context("failed to read user id")?;
                Ok(User::from_new(id, user))
            }
            Err(err) if is_unique_violation(&err) => {
                debug!("username already taken");
                Err(SaveError::Conflict)
            }
            Err(err) => Err(SaveError::Other(
                anyhow::Error::new(err).context("failed to insert user"),
            )),
        }
    }

    #[instrument(skip(self))]
    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let query = "SELECT id, username, password_hash, salt FROM users WHERE username = $1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(username)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup user")?;

        row.map(|row| {
            Ok::<User, sqlx::Error>(User {
                id: row.try_get("id")?,
                username: row.try_get("username")?,
                password_hash: row.try_get("password_hash")?,
                salt: row.try_get("salt")?,
            })
        })
        .transpose()
        .context("failed to decode user row")
    }

    async fn ping(&self) -> Result<()> {
        let acquire_span = info_span!(
            "db.acquire",
            db.system = "postgresql",
            db.operation = "ACQUIRE"
        );
        let mut conn = self
            .pool
            .acquire()
            .instrument(acquire_span)
            .await
            .context("failed to acquire database connection")?;

        let ping_span = info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
        conn.ping()
            .instrument(ping_span)
            .await
            .context("failed to ping database")
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some(UNIQUE_VIOLATION),
        _ => false,
    }
}
