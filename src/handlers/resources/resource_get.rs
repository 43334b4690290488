use axum::extract::{Path, State};
use serde_json::{json, Value};

use super::{parse_id, Resource};
use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /api/data/:resource/:id - show single record
pub async fn resource_get(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, String)>,
) -> ApiResult<Value> {
    let resource: Resource = resource.parse()?;
    let id = parse_id(&id)?;

    let sql = format!("SELECT * FROM \"{}\" WHERE id = $1", resource.table());
    let row = state
        .store
        .query(&sql, &[json!(id)])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::not_found(format!("{} {} not found", resource.table(), id)))?;

    Ok(ApiResponse::success(row))
}
