use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::auth::TRUSTED_IDENTITY_HEADER;
use crate::error::ApiError;

/// Caller email as injected by the access gate.
///
/// Only valid on routes layered with [`super::access_middleware`]; the header
/// is never re-validated here.
#[derive(Debug, Clone)]
pub struct TrustedIdentity(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for TrustedIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(TRUSTED_IDENTITY_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(|v| TrustedIdentity(v.to_string()))
            .ok_or_else(|| {
                tracing::error!("Route reached without a trusted identity; access gate missing from router");
                ApiError::internal_server_error("Trusted identity missing")
            })
    }
}
