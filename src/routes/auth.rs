use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use sqlx::SqlitePool;
use utoipa::ToSchema;

use crate::app::AppState;
use crate::errors::{AppError, AppResult};
use crate::models::user::{
    AuthResponse, AuthUserView, DbUser, LoginRequest, RegisterRequest, Role,
};
use crate::utils::{hash_password, verify_password};

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = MessageResponse),
        (status = 400, description = "Missing fields"),
        (status = 409, description = "Email already in use")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    let full_name = require_field(payload.full_name)?;
    let email = require_field(payload.email)?;
    let password = require_field(payload.password)?;

    let role = match payload.role.as_deref() {
        Some(value) => Role::parse(value).ok_or_else(|| AppError::validation("Invalid role"))?,
        None => Role::default(),
    };

    ensure_email_available(&state.pool, &email).await?;

    let password_hash = hash_password(&password)?;
    let user_id = uuid::Uuid::new_v4();

    sqlx::query("INSERT INTO users (id, full_name, email, password_hash, role) VALUES (?, ?, ?, ?, ?)")
        .bind(user_id)
        .bind(&full_name)
        .bind(&email)
        .bind(password_hash)
        .bind(role)
        .execute(&state.pool)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "created".to_string(),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let db_user = sqlx::query_as::<_, DbUser>(
        "SELECT id, full_name, email, password_hash, role FROM users WHERE email = ?",
    )
    .bind(&payload.email)
    .fetch_optional(&state.pool)
    .await?;

    // Unknown email and wrong password answer identically so callers cannot
    // enumerate accounts.
    let db_user = db_user.ok_or_else(|| AppError::unauthorized("Invalid credentials"))?;

    if !verify_password(&payload.password, &db_user.password_hash)? {
        return Err(AppError::unauthorized("Invalid credentials"));
    }

    let access_token = state.jwt.encode(db_user.id, db_user.role)?;

    Ok(Json(AuthResponse {
        access_token,
        user: AuthUserView {
            id: db_user.id,
            full_name: db_user.full_name,
            role: db_user.role,
        },
    }))
}

fn require_field(value: Option<String>) -> AppResult<String> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::validation("Missing fields (full_name, email, password required)"))
}

pub(crate) async fn ensure_email_available(pool: &SqlitePool, email: &str) -> AppResult<()> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM users WHERE email = ?")
        .bind(email)
        .fetch_one(pool)
        .await?;

    if count > 0 {
        return Err(AppError::conflict("Email already exists"));
    }

    Ok(())
}
