use axum::extract::{Path, State};
use serde_json::{json, Value};
use tracing::info;

use super::{parse_id, Resource};
use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, TrustedIdentity};

/// DELETE /api/data/:resource/:id
pub async fn resource_delete(
    State(state): State<AppState>,
    TrustedIdentity(email): TrustedIdentity,
    Path((resource, id)): Path<(String, String)>,
) -> ApiResult<Value> {
    let resource: Resource = resource.parse()?;
    let id = parse_id(&id)?;

    let sql = format!("DELETE FROM \"{}\" WHERE id = $1", resource.table());
    let affected = state.store.execute(&sql, &[json!(id)]).await?;
    if affected == 0 {
        return Err(ApiError::not_found(format!("{} {} not found", resource.table(), id)));
    }

    info!("{} deleted {} {}", email, resource.table(), id);
    Ok(ApiResponse::success(json!({ "id": id, "deleted": true })))
}
