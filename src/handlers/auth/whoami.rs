// handlers/auth/whoami.rs - GET /api/auth/whoami handler

use axum::extract::State;
use serde::Serialize;

use crate::app::AppState;
use crate::middleware::{ApiResponse, TrustedIdentity};

#[derive(Debug, Serialize)]
pub struct WhoAmI {
    pub email: String,
    pub dev_bypass: bool,
}

/// GET /api/auth/whoami - the identity the access gate admitted
pub async fn whoami(
    State(state): State<AppState>,
    TrustedIdentity(email): TrustedIdentity,
) -> ApiResponse<WhoAmI> {
    ApiResponse::success(WhoAmI {
        email,
        dev_bypass: state.dev_bypass,
    })
}
