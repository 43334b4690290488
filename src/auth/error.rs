use thiserror::Error;

use crate::error::ApiError;

/// Failures while obtaining the identity provider's signing keys
#[derive(Debug, Error)]
pub enum KeySetError {
    #[error("key set request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("key set endpoint returned status {0}")]
    Status(u16),

    #[error("key set body is not a JWK set: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("key set fetch timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("key set contains no keys")]
    Empty,

    #[error("key set fetch failed while this request was waiting for it")]
    Unavailable,
}

/// Why a presented assertion was not accepted. Logged, never returned to callers.
#[derive(Debug, Error)]
pub enum AssertionError {
    #[error("malformed assertion: {0}")]
    Malformed(#[source] jsonwebtoken::errors::Error),

    #[error("no signing key with kid '{0}'")]
    UnknownKey(String),

    #[error("unusable signing key: {0}")]
    BadKey(#[source] jsonwebtoken::errors::Error),

    #[error(transparent)]
    KeySet(#[from] KeySetError),

    #[error("assertion rejected: {0}")]
    Rejected(#[source] jsonwebtoken::errors::Error),
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing access assertion")]
    MissingAssertion,

    #[error("invalid access assertion: {0}")]
    InvalidAssertion(#[from] AssertionError),

    #[error("access assertion carries no identity")]
    MissingIdentity,

    #[error("failed to forward request: {0}")]
    InternalForwarding(String),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingAssertion => ApiError::unauthorized("Unauthorized: missing access assertion"),
            // cause stays server-side
            AuthError::InvalidAssertion(_) => ApiError::unauthorized("Unauthorized: invalid access assertion"),
            AuthError::MissingIdentity => ApiError::unauthorized("Unauthorized: no identity in access assertion"),
            AuthError::InternalForwarding(detail) => {
                ApiError::internal_server_error(format!("Internal forwarding error: {}", detail))
            }
        }
    }
}
