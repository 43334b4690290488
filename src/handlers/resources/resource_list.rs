use axum::extract::{Path, Query, State};
use serde::Deserialize;
use serde_json::{json, Value};

use super::Resource;
use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 1000;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/data/:resource - list records ordered by id
pub async fn resource_list(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<Value>> {
    let resource: Resource = resource.parse()?;
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = query.offset.unwrap_or(0).max(0);

    let sql = format!("SELECT * FROM \"{}\" ORDER BY id LIMIT $1 OFFSET $2", resource.table());
    let rows = state.store.query(&sql, &[json!(limit), json!(offset)]).await?;

    Ok(ApiResponse::success(rows))
}
