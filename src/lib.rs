//! # credstore
//!
//! `credstore` registers users with salted password hashes and validates
//! login attempts against them.
//!
//! ## Credentials
//!
//! Passwords are hashed with **Argon2id** using a fresh random salt per user.
//! The salt is stored next to the hash; plaintext passwords are never stored.
//! Usernames are unique and case-sensitive; no normalization is applied.
//!
//! Failed authentication is not an error: an unknown username and a wrong
//! password both yield `None`, so callers cannot tell them apart by result.
//! Unknown usernames skip the hash comparison.
//!
//! ## Storage
//!
//! The repository talks to an abstract `UserStore`. Postgres is the production
//! backend; uniqueness is enforced by the database and a violated constraint
//! is reported as a duplicate username.

pub mod api;
pub mod cli;
pub mod credentials;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
