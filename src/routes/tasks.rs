use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::app::AppState;
use crate::errors::{AppError, AppResult};
use crate::jwt::AuthUser;
use crate::models::task::{Task, TaskCreateRequest, TaskStatus, TaskUpdateRequest};
use crate::utils::utc_now;

const TASK_COLUMNS: &str =
    "id, title, description, status, deadline, project_id, assignee_id, created_at";

#[utoipa::path(
    get,
    path = "/tasks",
    tag = "Tasks",
    security(("bearerAuth" = [])),
    responses((status = 200, description = "List tasks", body = [Task]))
)]
pub async fn list_tasks(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> AppResult<Json<Vec<Task>>> {
    let tasks = sqlx::query_as::<_, Task>(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks ORDER BY created_at DESC"
    ))
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(tasks))
}

#[utoipa::path(
    post,
    path = "/tasks",
    tag = "Tasks",
    security(("bearerAuth" = [])),
    request_body = TaskCreateRequest,
    responses(
        (status = 201, description = "Task created", body = Task),
        (status = 400, description = "Missing title or project_id"),
        (status = 404, description = "Project does not exist")
    )
)]
pub async fn create_task(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(payload): Json<TaskCreateRequest>,
) -> AppResult<(StatusCode, Json<Task>)> {
    let title = payload
        .title
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::validation("Missing fields (title, project_id required)"))?;
    let project_id = payload
        .project_id
        .ok_or_else(|| AppError::validation("Missing fields (title, project_id required)"))?;

    let status = match payload.status.as_deref() {
        Some(value) => {
            TaskStatus::parse(value).ok_or_else(|| AppError::validation("Invalid status"))?
        }
        None => TaskStatus::default(),
    };

    // A task belongs to exactly one project; refuse to create orphans.
    let exists: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM projects WHERE id = ?")
        .bind(project_id)
        .fetch_one(&state.pool)
        .await?;
    if exists == 0 {
        return Err(AppError::not_found("Project not found"));
    }

    let task_id = Uuid::new_v4();
    let now = utc_now();

    sqlx::query(
        "INSERT INTO tasks (id, title, description, status, deadline, project_id, assignee_id, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(task_id)
    .bind(&title)
    .bind(&payload.description)
    .bind(status)
    .bind(payload.deadline)
    .bind(project_id)
    .bind(payload.assignee_id)
    .bind(now)
    .execute(&state.pool)
    .await?;

    let task = fetch_task(&state.pool, task_id).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

#[utoipa::path(
    get,
    path = "/tasks/project/{project_id}",
    tag = "Tasks",
    security(("bearerAuth" = [])),
    params(("project_id" = Uuid, Path, description = "Project id")),
    responses((status = 200, description = "Tasks for the project", body = [Task]))
)]
pub async fn list_project_tasks(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(project_id): Path<Uuid>,
) -> AppResult<Json<Vec<Task>>> {
    // An unknown project id yields an empty list, not an error.
    let tasks = sqlx::query_as::<_, Task>(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE project_id = ? ORDER BY created_at DESC"
    ))
    .bind(project_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(tasks))
}

#[utoipa::path(
    put,
    path = "/tasks/{id}",
    tag = "Tasks",
    security(("bearerAuth" = [])),
    params(("id" = Uuid, Path, description = "Task id")),
    request_body = TaskUpdateRequest,
    responses(
        (status = 200, description = "Task updated", body = Task),
        (status = 400, description = "Invalid status")
    )
)]
pub async fn update_task(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<TaskUpdateRequest>,
) -> AppResult<Json<Task>> {
    let mut task = fetch_task(&state.pool, id).await?;

    if let Some(title) = payload.title {
        task.title = title;
    }
    if let Some(status) = payload.status.as_deref() {
        task.status = TaskStatus::parse(status).ok_or_else(|| AppError::validation("Invalid status"))?;
    }
    if payload.deadline.is_some() {
        task.deadline = payload.deadline;
    }
    if payload.assignee_id.is_some() {
        task.assignee_id = payload.assignee_id;
    }

    sqlx::query("UPDATE tasks SET title = ?, status = ?, deadline = ?, assignee_id = ? WHERE id = ?")
        .bind(&task.title)
        .bind(task.status)
        .bind(task.deadline)
        .bind(task.assignee_id)
        .bind(task.id)
        .execute(&state.pool)
        .await?;

    Ok(Json(task))
}

#[utoipa::path(
    delete,
    path = "/tasks/{id}",
    tag = "Tasks",
    security(("bearerAuth" = [])),
    params(("id" = Uuid, Path, description = "Task id")),
    responses((status = 204, description = "Task deleted"))
)]
pub async fn delete_task(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let affected = sqlx::query("DELETE FROM tasks WHERE id = ?")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if affected.rows_affected() == 0 {
        return Err(AppError::not_found("Task not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_task(pool: &SqlitePool, task_id: Uuid) -> AppResult<Task> {
    sqlx::query_as::<_, Task>(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?"))
        .bind(task_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("Task not found"))
}
