use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::app::AppState;
use crate::errors::{AppError, AppResult};
use crate::jwt::AuthUser;
use crate::models::project::{
    AddMemberRequest, DbProject, Project, ProjectCreateRequest, ProjectMetrics,
    ProjectUpdateRequest, StatusBreakdown,
};
use crate::models::task::TaskStatus;
use crate::models::user::{DbUser, User};
use crate::utils::utc_now;

#[utoipa::path(
    get,
    path = "/projects",
    tag = "Projects",
    security(("bearerAuth" = [])),
    responses((status = 200, description = "List projects", body = [Project]))
)]
pub async fn list_projects(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> AppResult<Json<Vec<Project>>> {
    let rows = sqlx::query_as::<_, DbProject>(
        "SELECT id, title, description, created_at FROM projects ORDER BY created_at DESC",
    )
    .fetch_all(&state.pool)
    .await?;

    let mut projects = Vec::with_capacity(rows.len());
    for row in rows {
        let members = load_members(&state.pool, row.id).await?;
        projects.push(Project::from_db(row, members));
    }

    Ok(Json(projects))
}

#[utoipa::path(
    post,
    path = "/projects",
    tag = "Projects",
    security(("bearerAuth" = [])),
    request_body = ProjectCreateRequest,
    responses(
        (status = 201, description = "Project created", body = Project),
        (status = 400, description = "Missing title")
    )
)]
pub async fn create_project(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(payload): Json<ProjectCreateRequest>,
) -> AppResult<(StatusCode, Json<Project>)> {
    let title = payload
        .title
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::validation("Title is required"))?;

    let project_id = Uuid::new_v4();
    let now = utc_now();

    // Project and memberships commit as one unit.
    let mut tx = state.pool.begin().await?;

    sqlx::query("INSERT INTO projects (id, title, description, created_at) VALUES (?, ?, ?, ?)")
        .bind(project_id)
        .bind(&title)
        .bind(&payload.description)
        .bind(now)
        .execute(&mut *tx)
        .await?;

    // Member ids that do not resolve are skipped without error.
    for member_id in payload.member_ids.unwrap_or_default() {
        let exists: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM users WHERE id = ?")
            .bind(member_id)
            .fetch_one(&mut *tx)
            .await?;

        if exists > 0 {
            sqlx::query(
                "INSERT OR IGNORE INTO project_members (project_id, user_id) VALUES (?, ?)",
            )
            .bind(project_id)
            .bind(member_id)
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await?;

    let project = fetch_project(&state.pool, project_id).await?;
    let members = load_members(&state.pool, project_id).await?;

    Ok((StatusCode::CREATED, Json(Project::from_db(project, members))))
}

#[utoipa::path(
    get,
    path = "/projects/{id}",
    tag = "Projects",
    security(("bearerAuth" = [])),
    params(("id" = Uuid, Path, description = "Project id")),
    responses((status = 200, description = "Project detail", body = Project))
)]
pub async fn get_project(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Project>> {
    let project = fetch_project(&state.pool, id).await?;
    let members = load_members(&state.pool, id).await?;
    Ok(Json(Project::from_db(project, members)))
}

#[utoipa::path(
    put,
    path = "/projects/{id}",
    tag = "Projects",
    security(("bearerAuth" = [])),
    params(("id" = Uuid, Path, description = "Project id")),
    request_body = ProjectUpdateRequest,
    responses((status = 200, description = "Project updated", body = Project))
)]
pub async fn update_project(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProjectUpdateRequest>,
) -> AppResult<Json<Project>> {
    let mut project = fetch_project(&state.pool, id).await?;

    if let Some(title) = payload.title {
        project.title = title;
    }
    if payload.description.is_some() {
        project.description = payload.description;
    }

    sqlx::query("UPDATE projects SET title = ?, description = ? WHERE id = ?")
        .bind(&project.title)
        .bind(&project.description)
        .bind(project.id)
        .execute(&state.pool)
        .await?;

    let members = load_members(&state.pool, id).await?;
    Ok(Json(Project::from_db(project, members)))
}

#[utoipa::path(
    delete,
    path = "/projects/{id}",
    tag = "Projects",
    security(("bearerAuth" = [])),
    params(("id" = Uuid, Path, description = "Project id")),
    responses((status = 204, description = "Project deleted"))
)]
pub async fn delete_project(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let project = fetch_project(&state.pool, id).await?;

    // A project owns its tasks: they go with it, along with the memberships,
    // in one transaction.
    let mut tx = state.pool.begin().await?;

    sqlx::query("DELETE FROM tasks WHERE project_id = ?")
        .bind(project.id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM project_members WHERE project_id = ?")
        .bind(project.id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM projects WHERE id = ?")
        .bind(project.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/projects/metrics",
    tag = "Projects",
    security(("bearerAuth" = [])),
    responses((status = 200, description = "Task metrics", body = ProjectMetrics))
)]
pub async fn metrics(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> AppResult<Json<ProjectMetrics>> {
    let total_tasks: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks")
        .fetch_one(&state.pool)
        .await?;

    let today = utc_now().date_naive();
    let overdue: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM tasks WHERE deadline IS NOT NULL AND deadline < ? AND status != ?",
    )
    .bind(today)
    .bind(TaskStatus::Done)
    .fetch_one(&state.pool)
    .await?;

    let counts = sqlx::query_as::<_, (TaskStatus, i64)>(
        "SELECT status, COUNT(*) FROM tasks GROUP BY status",
    )
    .fetch_all(&state.pool)
    .await?;

    let mut by_status = StatusBreakdown {
        to_do: 0,
        in_progress: 0,
        done: 0,
    };
    for (status, count) in counts {
        match status {
            TaskStatus::ToDo => by_status.to_do = count,
            TaskStatus::InProgress => by_status.in_progress = count,
            TaskStatus::Done => by_status.done = count,
        }
    }

    Ok(Json(ProjectMetrics {
        total_tasks,
        overdue,
        by_status,
    }))
}

#[utoipa::path(
    post,
    path = "/projects/{id}/members",
    tag = "Projects",
    security(("bearerAuth" = [])),
    params(("id" = Uuid, Path, description = "Project id")),
    request_body = AddMemberRequest,
    responses((status = 200, description = "Member added", body = Project))
)]
pub async fn add_member(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddMemberRequest>,
) -> AppResult<Json<Project>> {
    let project = fetch_project(&state.pool, id).await?;

    let exists: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM users WHERE id = ?")
        .bind(payload.user_id)
        .fetch_one(&state.pool)
        .await?;
    if exists == 0 {
        return Err(AppError::not_found("User not found"));
    }

    // Re-adding an existing member is a no-op.
    sqlx::query("INSERT OR IGNORE INTO project_members (project_id, user_id) VALUES (?, ?)")
        .bind(project.id)
        .bind(payload.user_id)
        .execute(&state.pool)
        .await?;

    let members = load_members(&state.pool, id).await?;
    Ok(Json(Project::from_db(project, members)))
}

#[utoipa::path(
    delete,
    path = "/projects/{id}/members/{user_id}",
    tag = "Projects",
    security(("bearerAuth" = [])),
    params(
        ("id" = Uuid, Path, description = "Project id"),
        ("user_id" = Uuid, Path, description = "User id")
    ),
    responses((status = 204, description = "Member removed"))
)]
pub async fn remove_member(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> AppResult<StatusCode> {
    let project = fetch_project(&state.pool, id).await?;

    let affected = sqlx::query("DELETE FROM project_members WHERE project_id = ? AND user_id = ?")
        .bind(project.id)
        .bind(user_id)
        .execute(&state.pool)
        .await?;

    if affected.rows_affected() == 0 {
        return Err(AppError::not_found("Membership not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_project(pool: &SqlitePool, project_id: Uuid) -> AppResult<DbProject> {
    sqlx::query_as::<_, DbProject>(
        "SELECT id, title, description, created_at FROM projects WHERE id = ?",
    )
    .bind(project_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("Project not found"))
}

async fn load_members(pool: &SqlitePool, project_id: Uuid) -> AppResult<Vec<User>> {
    let members = sqlx::query_as::<_, DbUser>(
        "SELECT u.id, u.full_name, u.email, u.password_hash, u.role
         FROM users u
         JOIN project_members pm ON pm.user_id = u.id
         WHERE pm.project_id = ?",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await?;

    Ok(members.into_iter().map(User::from).collect())
}
