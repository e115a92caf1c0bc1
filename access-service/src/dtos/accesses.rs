use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{Access, AccessStatus, CreateAccess};
use crate::utils::time::{utc_second, utc_second_opt};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAccessRequest {
    pub user_id: Uuid,
    pub resource_id: Uuid,

    #[serde(with = "utc_second")]
    pub expires_at: DateTime<Utc>,

    #[validate(length(max = 2000, message = "Comment must be at most 2000 characters"))]
    pub comment: Option<String>,
}

impl From<CreateAccessRequest> for CreateAccess {
    fn from(req: CreateAccessRequest) -> Self {
        CreateAccess {
            user_id: req.user_id,
            resource_id: req.resource_id,
            expires_at: req.expires_at,
            comment: req.comment,
        }
    }
}

/// Body of `PATCH /accesses/{id}`.
///
/// An omitted status means "stay active": a pure expiry and/or comment
/// update, still subject to the lifecycle rules.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAccessRequest {
    pub status: Option<AccessStatus>,

    #[serde(default, with = "utc_second_opt")]
    pub expires_at: Option<DateTime<Utc>>,

    #[validate(length(max = 2000, message = "Comment must be at most 2000 characters"))]
    pub comment: Option<String>,
}

/// Query parameters for `GET /accesses`.
///
/// `expires_before` is parsed in the handler so a bad date yields a JSON
/// 400 instead of a plain-text query rejection.
#[derive(Debug, Deserialize, Default)]
pub struct ListAccessesQuery {
    pub user_id: Option<Uuid>,
    pub resource_id: Option<Uuid>,
    pub status: Option<AccessStatus>,
    pub expires_before: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AccessResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub resource_id: Uuid,

    #[serde(with = "utc_second")]
    pub granted_at: DateTime<Utc>,

    #[serde(with = "utc_second")]
    pub expires_at: DateTime<Utc>,

    pub status: AccessStatus,
    pub comment: Option<String>,
}

impl From<Access> for AccessResponse {
    fn from(access: Access) -> Self {
        AccessResponse {
            id: access.id,
            user_id: access.user_id,
            resource_id: access.resource_id,
            granted_at: access.granted_at,
            expires_at: access.expires_at,
            status: access.status,
            comment: access.comment,
        }
    }
}
