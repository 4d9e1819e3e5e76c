pub mod health;
pub use self::health::health;

pub mod signup;
pub use self::signup::signup;

pub mod signin;
pub use self::signin::signin;

// common types and checks for the handlers
use crate::credentials::Credentials;
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const USERNAME_MIN: usize = 4;
const USERNAME_MAX: usize = 20;
const PASSWORD_MIN: usize = 8;
const PASSWORD_MAX: usize = 20;

#[derive(ToSchema, Serialize, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for CredentialsRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsRequest")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

impl From<CredentialsRequest> for Credentials {
    fn from(request: CredentialsRequest) -> Self {
        Self::new(request.username, request.password)
    }
}

pub fn valid_username(username: &str) -> bool {
    (USERNAME_MIN..=USERNAME_MAX).contains(&username.chars().count())
}

/// Between 8 and 20 characters with an uppercase letter, a lowercase letter
/// and at least one digit or symbol.
pub fn valid_password(password: &str) -> bool {
    if !(PASSWORD_MIN..=PASSWORD_MAX).contains(&password.chars().count()) {
        return false;
    }

    let has = |pattern: &str| Regex::new(pattern).is_ok_and(|re| re.is_match(password));

    has(r"\p{Lu}") && has(r"\p{Ll}") && has(r"[\d\W]")
}
