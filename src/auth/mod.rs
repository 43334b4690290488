pub mod audience;
pub mod error;
pub mod keyset;
pub mod verifier;

use std::sync::Arc;

use axum::http::HeaderMap;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::{AccessConfig, AccessMode, ConfigError};

pub use audience::{classify_host, AudiencePolicy, HostClass};
pub use error::{AssertionError, AuthError, KeySetError};
pub use keyset::{CachedKeySet, HttpKeySetSource, KeySetCache, KeySetSource};
pub use verifier::AssertionVerifier;

/// Header the identity provider puts the signed assertion in
pub const ASSERTION_HEADER: &str = "cf-access-jwt-assertion";

/// Header carrying the verified caller to downstream handlers
pub const TRUSTED_IDENTITY_HEADER: &str = "x-verified-user-email";

/// Identity assigned to every request while the dev bypass is active
pub const DEV_BYPASS_IDENTITY: &str = "dev-bypass@localhost.invalid";

/// Claims read from a verified access assertion
#[derive(Debug, Deserialize)]
pub struct AccessClaims {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub sub: Option<String>,
}

/// A non-empty caller email that passed verification (or the dev bypass)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity(String);

impl VerifiedIdentity {
    pub(crate) fn new(email: String) -> Option<Self> {
        let email = email.trim();
        if email.is_empty() {
            None
        } else {
            Some(Self(email.to_string()))
        }
    }

    fn dev_bypass() -> Self {
        Self(DEV_BYPASS_IDENTITY.to_string())
    }

    pub fn email(&self) -> &str {
        &self.0
    }
}

/// Gate in front of every handler.
///
/// `Development` never touches headers or keys; `Enforcing` requires a valid
/// assertion for the audience the request host maps to.
pub enum Authenticator {
    Development,
    Enforcing {
        policy: AudiencePolicy,
        verifier: AssertionVerifier,
    },
}

impl Authenticator {
    /// Build the gate described by the process configuration
    pub fn from_mode(mode: &AccessMode) -> Result<Self, ConfigError> {
        match mode {
            AccessMode::DevBypass => {
                warn!("Access verification DISABLED: every request runs as {}", DEV_BYPASS_IDENTITY);
                Ok(Authenticator::Development)
            }
            AccessMode::Enforce(access) => {
                let source = HttpKeySetSource::new(access.certs_url()?, access.key_fetch_timeout).map_err(|e| {
                    ConfigError::Invalid {
                        key: "ACCESS_TEAM_DOMAIN",
                        reason: e.to_string(),
                    }
                })?;
                Ok(Self::enforcing(access, Arc::new(source)))
            }
        }
    }

    /// Enforcing gate over an explicit key source
    pub fn enforcing(access: &AccessConfig, source: Arc<dyn KeySetSource>) -> Self {
        let keys = KeySetCache::new(source, access.key_cache_ttl)
            .with_refresh_interval(access.key_refresh_interval)
            .with_fetch_timeout(access.key_fetch_timeout);

        Authenticator::Enforcing {
            policy: AudiencePolicy::new(
                access.root_domains.clone(),
                access.root_audience.clone(),
                access.subdomain_audience.clone(),
            ),
            verifier: AssertionVerifier::new(access.issuer(), keys),
        }
    }

    pub fn is_bypass(&self) -> bool {
        matches!(self, Authenticator::Development)
    }

    /// Decide who is calling. `host` is the request hostname, if any.
    pub async fn authenticate(&self, headers: &HeaderMap, host: Option<&str>) -> Result<VerifiedIdentity, AuthError> {
        let (policy, verifier) = match self {
            Authenticator::Development => return Ok(VerifiedIdentity::dev_bypass()),
            Authenticator::Enforcing { policy, verifier } => (policy, verifier),
        };

        let token = headers
            .get(ASSERTION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingAssertion)?;

        let host = host.unwrap_or_default();
        let audience = policy.audience_for(host);
        debug!("Verifying access assertion for host '{}' as {:?}", host, policy.classify(host));

        verifier.verify(token, audience).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_identity_is_rejected() {
        assert!(VerifiedIdentity::new(String::new()).is_none());
        assert!(VerifiedIdentity::new("   ".to_string()).is_none());
        assert_eq!(
            VerifiedIdentity::new(" admin@cards.example ".to_string()).unwrap().email(),
            "admin@cards.example"
        );
    }

    #[tokio::test]
    async fn test_dev_bypass_ignores_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(ASSERTION_HEADER, "garbage".parse().unwrap());
        headers.insert(TRUSTED_IDENTITY_HEADER, "forged@evil.example".parse().unwrap());

        let identity = Authenticator::Development
            .authenticate(&headers, Some("root.com"))
            .await
            .unwrap();
        assert_eq!(identity.email(), DEV_BYPASS_IDENTITY);
    }
}
