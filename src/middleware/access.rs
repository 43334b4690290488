use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::HOST, HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use futures::FutureExt;
use tracing::{debug, error, warn};

use crate::auth::audience::normalize_host;
use crate::auth::{AuthError, Authenticator, VerifiedIdentity, TRUSTED_IDENTITY_HEADER};
use crate::error::ApiError;

/// Access gate middleware. Every route sits behind this.
///
/// Verifies the caller, then hands the next stage a rebuilt request whose
/// trusted-identity header is the verified email. Nothing downstream runs
/// before verification has finished.
pub async fn access_middleware(
    State(authenticator): State<Arc<Authenticator>>,
    request: Request,
    next: Next,
) -> Response {
    let host = request_hostname(&request);

    let identity = match authenticator.authenticate(request.headers(), host.as_deref()).await {
        Ok(identity) => identity,
        Err(err) => return reject(err, host.as_deref()),
    };

    let forwarded = match forward_with_identity(request, &identity) {
        Ok(forwarded) => forwarded,
        Err(err) => return reject(err, host.as_deref()),
    };

    debug!("Forwarding request for {}", identity.email());

    match AssertUnwindSafe(next.run(forwarded)).catch_unwind().await {
        Ok(response) => response,
        Err(panic) => reject(AuthError::InternalForwarding(panic_message(panic.as_ref())), host.as_deref()),
    }
}

fn reject(err: AuthError, host: Option<&str>) -> Response {
    let host = host.unwrap_or("<none>");
    match &err {
        AuthError::MissingAssertion => debug!("Rejected request for host '{}': {}", host, err),
        AuthError::InvalidAssertion(_) | AuthError::MissingIdentity => {
            warn!("Rejected request for host '{}': {}", host, err)
        }
        AuthError::InternalForwarding(_) => error!("Request for host '{}' failed after verification: {}", host, err),
    }
    ApiError::from(err).into_response()
}

/// Rebuild `request` for the next stage with the identity header forced.
///
/// Method, URI, version, extensions and body move over untouched. Any
/// client-supplied values of the identity header are replaced.
pub fn forward_with_identity(request: Request, identity: &VerifiedIdentity) -> Result<Request, AuthError> {
    let value = HeaderValue::from_str(identity.email()).map_err(|e| {
        AuthError::InternalForwarding(format!(
            "identity {:?} is not a valid header value: {}",
            identity.email(),
            e
        ))
    })?;

    let (parts, body) = request.into_parts();

    let mut builder = Request::builder()
        .method(parts.method)
        .uri(parts.uri)
        .version(parts.version);

    if let Some(headers) = builder.headers_mut() {
        *headers = parts.headers;
        headers.insert(HeaderName::from_static(TRUSTED_IDENTITY_HEADER), value);
    }
    if let Some(extensions) = builder.extensions_mut() {
        *extensions = parts.extensions;
    }

    builder
        .body(body)
        .map_err(|e| AuthError::InternalForwarding(format!("could not rebuild request: {}", e)))
}

/// Hostname the request was addressed to, without port
pub fn request_hostname(request: &Request) -> Option<String> {
    request
        .uri()
        .host()
        .or_else(|| request.headers().get(HOST).and_then(|v| v.to_str().ok()))
        .map(normalize_host)
        .filter(|h| !h.is_empty())
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        format!("downstream handler panicked: {}", msg)
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        format!("downstream handler panicked: {}", msg)
    } else {
        "downstream handler panicked".to_string()
    }
}
