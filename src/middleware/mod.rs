pub mod access;
pub mod identity;
pub mod response;

pub use access::{access_middleware, forward_with_identity, request_hostname};
pub use identity::TrustedIdentity;
pub use response::{ApiResponse, ApiResult};
