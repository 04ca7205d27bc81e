use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
pub enum TaskStatus {
    #[serde(rename = "To Do")]
    #[sqlx(rename = "To Do")]
    ToDo,
    #[serde(rename = "In Progress")]
    #[sqlx(rename = "In Progress")]
    InProgress,
    #[sqlx(rename = "Done")]
    Done,
}

impl TaskStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "To Do" => Some(TaskStatus::ToDo),
            "In Progress" => Some(TaskStatus::InProgress),
            "Done" => Some(TaskStatus::Done),
            _ => None,
        }
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::ToDo
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    #[schema(example = "2025-10-10")]
    pub deadline: Option<NaiveDate>,
    pub project_id: Uuid,
    pub assignee_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TaskCreateRequest {
    #[schema(example = "Define launch checklist")]
    pub title: Option<String>,
    pub description: Option<String>,
    #[schema(example = "To Do")]
    pub status: Option<String>,
    #[schema(example = "2025-10-10")]
    pub deadline: Option<NaiveDate>,
    pub project_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TaskUpdateRequest {
    pub title: Option<String>,
    #[schema(example = "In Progress")]
    pub status: Option<String>,
    #[schema(example = "2025-11-01")]
    pub deadline: Option<NaiveDate>,
    pub assignee_id: Option<Uuid>,
}
