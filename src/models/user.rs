use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// User role. Stored as text but closed at every boundary: request payloads
/// carry free strings and must go through [`Role::parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Developer,
}

impl Role {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "admin" => Some(Role::Admin),
            "manager" => Some(Role::Manager),
            "developer" => Some(Role::Developer),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Developer => "developer",
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Developer
    }
}

/// Public view of a user. The password hash never leaves the store layer.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbUser {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

impl From<DbUser> for User {
    fn from(value: DbUser) -> Self {
        User {
            id: value.id,
            full_name: value.full_name,
            email: value.email,
            role: value.role,
        }
    }
}

/// `GET /users` answers with an array for admins/managers and with the
/// caller's own record otherwise.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum UserListing {
    All(Vec<User>),
    Own(User),
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[schema(example = "Ada Lovelace")]
    pub full_name: Option<String>,
    #[schema(example = "ada@example.com")]
    pub email: Option<String>,
    #[schema(example = "S3cureP@ssw0rd")]
    pub password: Option<String>,
    #[schema(example = "developer")]
    pub role: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[schema(example = "S3cureP@ssw0rd")]
    pub password: String,
}

/// Login user view: id, name and role only.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthUserView {
    pub id: Uuid,
    pub full_name: String,
    pub role: Role,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub access_token: String,
    pub user: AuthUserView,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UserCreateRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UserUpdateRequest {
    pub full_name: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}
