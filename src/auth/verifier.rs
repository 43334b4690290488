use std::sync::Arc;

use jsonwebtoken::jwk::Jwk;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, TokenData, Validation};
use tracing::debug;

use super::error::{AssertionError, AuthError};
use super::keyset::{CachedKeySet, KeySetCache};
use super::{AccessClaims, VerifiedIdentity};

/// The identity provider signs access assertions with RS256 only.
pub const ASSERTION_ALGORITHM: Algorithm = Algorithm::RS256;

/// Checks signature, issuer, audience and lifetime of access assertions
pub struct AssertionVerifier {
    issuer: String,
    keys: KeySetCache,
}

impl AssertionVerifier {
    pub fn new(issuer: impl Into<String>, keys: KeySetCache) -> Self {
        Self {
            issuer: issuer.into(),
            keys,
        }
    }

    /// Verify `token` for `audience` and return the caller's identity
    pub async fn verify(&self, token: &str, audience: &str) -> Result<VerifiedIdentity, AuthError> {
        let claims = self.verified_claims(token, audience).await?;

        debug!("Access assertion verified for sub {:?}", claims.sub);

        claims
            .email
            .and_then(VerifiedIdentity::new)
            .ok_or(AuthError::MissingIdentity)
    }

    async fn verified_claims(&self, token: &str, audience: &str) -> Result<AccessClaims, AssertionError> {
        let header = decode_header(token).map_err(AssertionError::Malformed)?;
        let validation = self.validation(audience);

        let keys = self.keys.get().await?;

        let Some(kid) = header.kid else {
            return try_each_key(token, &keys, &validation);
        };

        let keys = if keys.keys.find(&kid).is_some() {
            keys
        } else {
            // unknown kid: the provider may have rotated since our last fetch
            self.keys.force_refresh(&keys).await?
        };
        let jwk = keys
            .keys
            .find(&kid)
            .ok_or_else(|| AssertionError::UnknownKey(kid.clone()))?;

        decode_with(token, jwk, &validation).map(|data| data.claims)
    }

    fn validation(&self, audience: &str) -> Validation {
        let mut validation = Validation::new(ASSERTION_ALGORITHM);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_audience(&[audience]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        validation.validate_nbf = true;
        validation
    }
}

fn decode_with(token: &str, jwk: &Jwk, validation: &Validation) -> Result<TokenData<AccessClaims>, AssertionError> {
    let key = DecodingKey::from_jwk(jwk).map_err(AssertionError::BadKey)?;
    decode::<AccessClaims>(token, &key, validation).map_err(AssertionError::Rejected)
}

/// Tokens without a `kid` are accepted if any published key verifies them
fn try_each_key(
    token: &str,
    keys: &Arc<CachedKeySet>,
    validation: &Validation,
) -> Result<AccessClaims, AssertionError> {
    let mut last_err = None;
    for jwk in &keys.keys.keys {
        match decode_with(token, jwk, validation) {
            Ok(data) => return Ok(data.claims),
            Err(e) => last_err = Some(e),
        }
    }
    Err(last_err.unwrap_or_else(|| AssertionError::UnknownKey("<none>".to_string())))
}
