use thiserror::Error;

/// Failures surfaced by [`super::UserRepository`].
///
/// Authentication failures are not errors: an unknown user or a wrong
/// password is reported as `Ok(None)` by `validate_user_password`.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("username already exists")]
    DuplicateUsername,
    #[error("failed to access the user store")]
    Store(#[source] anyhow::Error),
    #[error("failed to hash password")]
    Hashing(#[source] anyhow::Error),
}

impl CredentialError {
    /// `true` when the caller sent something that conflicts with stored state,
    /// as opposed to a server-side fault.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::DuplicateUsername)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn store_error_hides_cause_in_display() {
        let err = CredentialError::Store(anyhow::anyhow!("connection refused: 10.0.0.7:5432"));
        assert_eq!(err.to_string(), "failed to access the user store");
        assert!(
            err.source()
                .map(ToString::to_string)
                .is_some_and(|cause| cause.contains("connection refused"))
        );
    }

    #[test]
    fn only_duplicate_username_is_client_error() {
        assert!(CredentialError::DuplicateUsername.is_client_error());
        assert!(!CredentialError::Store(anyhow::anyhow!("boom")).is_client_error());
        assert!(!CredentialError::Hashing(anyhow::anyhow!("boom")).is_client_error());
    }
}
