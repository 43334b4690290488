use axum::extract::{rejection::JsonRejection, Path, State};
use axum::Json;
use serde_json::Value;
use tracing::info;

use super::{is_column_name, Resource};
use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, TrustedIdentity};

/// POST /api/data/:resource - insert one record from a JSON object
pub async fn resource_post(
    State(state): State<AppState>,
    TrustedIdentity(email): TrustedIdentity,
    Path(resource): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    let resource: Resource = resource.parse()?;
    let Json(body) = payload.map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {}", e.body_text())))?;
    let Value::Object(fields) = body else {
        return Err(ApiError::bad_request("Request body must be a JSON object"));
    };

    if let Some(bad) = fields.keys().find(|k| !is_column_name(k)) {
        return Err(ApiError::bad_request(format!("Invalid field name '{}'", bad)));
    }

    let sql = if fields.is_empty() {
        format!("INSERT INTO \"{}\" DEFAULT VALUES RETURNING *", resource.table())
    } else {
        let columns: Vec<String> = fields.keys().map(|k| format!("\"{}\"", k)).collect();
        let placeholders: Vec<String> = (1..=fields.len()).map(|i| format!("${}", i)).collect();
        format!(
            "INSERT INTO \"{}\" ({}) VALUES ({}) RETURNING *",
            resource.table(),
            columns.join(", "),
            placeholders.join(", ")
        )
    };
    let params: Vec<Value> = fields.into_iter().map(|(_, v)| v).collect();

    let row = state
        .store
        .query(&sql, &params)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::internal_server_error("Insert returned no row"))?;

    info!("{} created a record in {}", email, resource.table());
    Ok(ApiResponse::created(row))
}
