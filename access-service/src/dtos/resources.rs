use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{CreateResource, Resource};

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateResourceRequest {
    #[validate(length(min = 2, max = 100, message = "Name must be 2-100 characters"))]
    pub name: String,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    #[serde(default = "default_true")]
    pub is_enabled: bool,
}

impl From<CreateResourceRequest> for CreateResource {
    fn from(req: CreateResourceRequest) -> Self {
        CreateResource {
            name: req.name.trim().to_string(),
            description: req.description,
            is_enabled: req.is_enabled,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateResourceRequest {
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    pub is_enabled: Option<bool>,
}

/// Query parameters for `GET /resources`.
#[derive(Debug, Deserialize, Default)]
pub struct ListResourcesQuery {
    /// Case-insensitive substring match on the name.
    pub name: Option<String>,
    pub is_enabled: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct ResourceResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_enabled: bool,
}

impl From<Resource> for ResourceResponse {
    fn from(resource: Resource) -> Self {
        ResourceResponse {
            id: resource.id,
            name: resource.name,
            description: resource.description,
            is_enabled: resource.is_enabled,
        }
    }
}
