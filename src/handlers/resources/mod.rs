// handlers/resources/mod.rs - card database resources
//
// Thin glue over the DataStore: table names come from a fixed enum and column
// names are checked before they reach SQL text; every value is bound.

use std::str::FromStr;

use crate::error::ApiError;

pub mod resource_delete; // DELETE /api/data/:resource/:id
pub mod resource_get;    // GET /api/data/:resource/:id
pub mod resource_list;   // GET /api/data/:resource
pub mod resource_post;   // POST /api/data/:resource

pub use resource_delete::resource_delete;
pub use resource_get::resource_get;
pub use resource_list::resource_list;
pub use resource_post::resource_post;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Heroes,
    Movies,
    Cards,
    Tags,
}

impl Resource {
    pub fn table(&self) -> &'static str {
        match self {
            Resource::Heroes => "heroes",
            Resource::Movies => "movies",
            Resource::Cards => "cards",
            Resource::Tags => "tags",
        }
    }
}

impl FromStr for Resource {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "heroes" => Ok(Resource::Heroes),
            "movies" => Ok(Resource::Movies),
            "cards" => Ok(Resource::Cards),
            "tags" => Ok(Resource::Tags),
            other => Err(ApiError::not_found(format!("Unknown resource '{}'", other))),
        }
    }
}

pub fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::bad_request(format!("Invalid id '{}'", raw)))
}

/// Lowercase snake_case identifiers only
pub fn is_column_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_lowercase() || c == '_')
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        && name.len() <= 63
}
