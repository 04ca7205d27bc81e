use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::app::AppState;
use crate::errors::{AppError, AppResult};
use crate::jwt::AuthUser;
use crate::models::user::{DbUser, Role, User, UserCreateRequest, UserListing, UserUpdateRequest};
use crate::policy::{self, UserUpdateScope};
use crate::routes::auth::ensure_email_available;
use crate::utils::hash_password;

#[utoipa::path(
    get,
    path = "/users",
    tag = "Users",
    security(("bearerAuth" = [])),
    responses((status = 200, description = "All users, or the caller's own record"))
)]
pub async fn list_users(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<UserListing>> {
    if policy::can_list_all_users(&auth) {
        let users = sqlx::query_as::<_, DbUser>(
            "SELECT id, full_name, email, password_hash, role FROM users",
        )
        .fetch_all(&state.pool)
        .await?;

        return Ok(Json(UserListing::All(
            users.into_iter().map(User::from).collect(),
        )));
    }

    let user = fetch_user(&state.pool, auth.user_id).await?;
    Ok(Json(UserListing::Own(user.into())))
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "Users",
    security(("bearerAuth" = [])),
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User detail", body = User),
        (status = 403, description = "Caller may not view this user")
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<User>> {
    if !policy::can_view_user(&auth, id) {
        return Err(AppError::forbidden("Forbidden"));
    }

    let user = fetch_user(&state.pool, id).await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    get,
    path = "/users/me",
    tag = "Users",
    security(("bearerAuth" = [])),
    responses((status = 200, description = "Current user", body = User))
)]
pub async fn me(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<User>> {
    let user = fetch_user(&state.pool, auth.user_id).await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    post,
    path = "/users",
    tag = "Users",
    security(("bearerAuth" = [])),
    request_body = UserCreateRequest,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Email already in use")
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<UserCreateRequest>,
) -> AppResult<(StatusCode, Json<User>)> {
    if !policy::can_create_user(&auth) {
        return Err(AppError::forbidden("Only admins can create users"));
    }

    let full_name = require_field(payload.full_name)?;
    let email = require_field(payload.email)?;
    let password = require_field(payload.password)?;

    let role = match payload.role.as_deref() {
        Some(value) => Role::parse(value).ok_or_else(|| AppError::validation("Invalid role"))?,
        None => Role::default(),
    };

    ensure_email_available(&state.pool, &email).await?;

    let password_hash = hash_password(&password)?;
    let user_id = Uuid::new_v4();

    sqlx::query("INSERT INTO users (id, full_name, email, password_hash, role) VALUES (?, ?, ?, ?, ?)")
        .bind(user_id)
        .bind(&full_name)
        .bind(&email)
        .bind(password_hash)
        .bind(role)
        .execute(&state.pool)
        .await?;

    let user = fetch_user(&state.pool, user_id).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "Users",
    security(("bearerAuth" = [])),
    params(("id" = Uuid, Path, description = "User id")),
    request_body = UserUpdateRequest,
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 400, description = "Invalid role"),
        (status = 403, description = "Caller may not update this user")
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UserUpdateRequest>,
) -> AppResult<Json<User>> {
    // The target is resolved before authorization, so a missing user answers
    // 404 to any caller.
    let mut user = fetch_user(&state.pool, id).await?;

    let scope = policy::user_update_scope(&auth, id)
        .ok_or_else(|| AppError::forbidden("Forbidden"))?;

    // Privilege escalation guard: a self-service update drops `role` without
    // erroring.
    let role = match scope {
        UserUpdateScope::AllFields => payload.role,
        UserUpdateScope::OwnProfile => None,
    };

    if let Some(full_name) = payload.full_name.filter(|v| !v.is_empty()) {
        user.full_name = full_name;
    }
    if let Some(password) = payload.password.filter(|v| !v.is_empty()) {
        user.password_hash = hash_password(&password)?;
    }
    if let Some(role) = role.as_deref() {
        user.role = Role::parse(role).ok_or_else(|| AppError::validation("Invalid role"))?;
    }

    sqlx::query("UPDATE users SET full_name = ?, password_hash = ?, role = ? WHERE id = ?")
        .bind(&user.full_name)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(user.id)
        .execute(&state.pool)
        .await?;

    Ok(Json(user.into()))
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "Users",
    security(("bearerAuth" = [])),
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 403, description = "Admin only")
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if !policy::can_delete_user(&auth) {
        return Err(AppError::forbidden("Only admins can delete users"));
    }

    let user = fetch_user(&state.pool, id).await?;

    // Removing a user must not leave dangling references: their task
    // assignments are cleared and their memberships dropped in the same
    // transaction.
    let mut tx = state.pool.begin().await?;

    sqlx::query("UPDATE tasks SET assignee_id = NULL WHERE assignee_id = ?")
        .bind(user.id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM project_members WHERE user_id = ?")
        .bind(user.id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

fn require_field(value: Option<String>) -> AppResult<String> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::validation("Missing fields (full_name, email, password required)"))
}

async fn fetch_user(pool: &SqlitePool, user_id: Uuid) -> AppResult<DbUser> {
    sqlx::query_as::<_, DbUser>(
        "SELECT id, full_name, email, password_hash, role FROM users WHERE id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("User not found"))
}
