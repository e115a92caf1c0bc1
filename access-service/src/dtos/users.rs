use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{CreateUser, User};

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(email(message = "Invalid email format"))]
    #[validate(length(min = 5, max = 255, message = "Email must be 5-255 characters"))]
    pub email: String,

    #[validate(length(min = 5, max = 255, message = "Full name must be 5-255 characters"))]
    pub full_name: String,

    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl From<CreateUserRequest> for CreateUser {
    fn from(req: CreateUserRequest) -> Self {
        CreateUser {
            email: req.email.trim().to_string(),
            full_name: req.full_name.trim().to_string(),
            is_active: req.is_active,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    pub is_active: Option<bool>,
}

/// Query parameters for `GET /users`.
#[derive(Debug, Deserialize, Default)]
pub struct ListUsersQuery {
    /// Case-insensitive substring match on name or email.
    pub search: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub is_active: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            is_active: user.is_active,
        }
    }
}
