//! Protected resource model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A protected resource that users may be granted access to.
///
/// Resource names are unique case-insensitively. Resources are never
/// deleted; a disabled resource keeps existing grants but cannot be
/// granted anew.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Resource {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_enabled: bool,
}

/// Input for creating a new resource.
#[derive(Debug, Clone)]
pub struct CreateResource {
    pub name: String,
    pub description: Option<String>,
    pub is_enabled: bool,
}
