//! Provisioning error types.

use thiserror::Error;
use uuid::Uuid;

/// Errors raised while creating, updating or removing users.
#[derive(Debug, Error)]
pub enum ProvisioningError {
    /// Input rejected before any remote call.
    #[error("invalid user: {0}")]
    Validation(String),

    /// The identity provider already knows this email.
    #[error("email already registered: {0}")]
    EmailTaken(String),

    /// Profile does not exist.
    #[error("user not found: {0}")]
    NotFound(Uuid),

    /// The identity provider call failed.
    #[error("identity provider error: {0}")]
    Identity(String),

    /// The profile write failed; the identity user was removed again.
    #[error("profile write failed: {0}")]
    Profile(String),

    /// The profile write failed and so did removing the identity user.
    #[error(
        "profile write failed ({profile_error}); identity user {user_id} left behind: \
         {compensation_error}"
    )]
    CompensationFailed {
        /// Orphaned identity user.
        user_id: Uuid,
        /// Original failure.
        profile_error: String,
        /// Failure of the compensating delete.
        compensation_error: String,
    },
}

impl ProvisioningError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::EmailTaken(_) => 409,
            Self::NotFound(_) => 404,
            Self::Identity(_) => 502,
            Self::Profile(_) | Self::CompensationFailed { .. } => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::EmailTaken(_) => "EMAIL_TAKEN",
            Self::NotFound(_) => "USER_NOT_FOUND",
            Self::Identity(_) => "IDENTITY_PROVIDER_ERROR",
            Self::Profile(_) => "PROFILE_WRITE_FAILED",
            Self::CompensationFailed { .. } => "COMPENSATION_FAILED",
        }
    }
}

impl From<reqwest::Error> for ProvisioningError {
    fn from(err: reqwest::Error) -> Self {
        Self::Identity(err.to_string())
    }
}
