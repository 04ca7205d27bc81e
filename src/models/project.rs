use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::user::User;

#[derive(Debug, Clone, FromRow)]
pub struct DbProject {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub members: Vec<User>,
}

impl Project {
    pub fn from_db(value: DbProject, members: Vec<User>) -> Self {
        Project {
            id: value.id,
            title: value.title,
            description: value.description,
            created_at: value.created_at,
            members,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProjectCreateRequest {
    #[schema(example = "Launch Planning")]
    pub title: Option<String>,
    #[schema(example = "Prepare milestones for the product launch.")]
    pub description: Option<String>,
    /// Ids that do not resolve to a user are skipped without error.
    pub member_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProjectUpdateRequest {
    #[schema(example = "Launch Planning - Updated")]
    pub title: Option<String>,
    #[schema(example = "Updated description")]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddMemberRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusBreakdown {
    #[serde(rename = "To Do")]
    pub to_do: i64,
    #[serde(rename = "In Progress")]
    pub in_progress: i64,
    #[serde(rename = "Done")]
    pub done: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProjectMetrics {
    pub total_tasks: i64,
    pub overdue: i64,
    pub by_status: StatusBreakdown,
}
